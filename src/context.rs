use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::value::Value;

pub type ContextRef = Rc<RefCell<Context>>;

/// A mutable slot holding one binding's current value.
pub type Variable = Rc<RefCell<Value>>;

/// One lexical scope. Reads walk the parent chain; writes always land in the
/// local mapping, shadowing any outer binding of the same name.
#[derive(Debug, Default)]
pub struct Context {
    parent: Option<ContextRef>,
    variables: IndexMap<String, Variable>,
}

impl Context {
    pub fn new() -> ContextRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_parent(parent: ContextRef) -> ContextRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            variables: IndexMap::new(),
        }))
    }

    pub fn child(ctx: &ContextRef) -> ContextRef {
        Self::with_parent(Rc::clone(ctx))
    }

    pub fn parent(&self) -> Option<&ContextRef> {
        self.parent.as_ref()
    }

    /// Writes `name` in this scope only.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.variables.get(name) {
            Some(slot) => *slot.borrow_mut() = value,
            None => {
                self.variables
                    .insert(name.to_string(), Rc::new(RefCell::new(value)));
            }
        }
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn local_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Finds the slot for `name`, searching this scope and then its ancestors.
    pub fn lookup(ctx: &ContextRef, name: &str) -> Option<Variable> {
        let scope = ctx.borrow();
        if let Some(slot) = scope.variables.get(name) {
            return Some(Rc::clone(slot));
        }
        let parent = scope.parent.clone()?;
        drop(scope);
        Context::lookup(&parent, name)
    }

    pub fn get(ctx: &ContextRef, name: &str) -> Option<Value> {
        Context::lookup(ctx, name).map(|slot| slot.borrow().clone())
    }
}
