//! Tables of named functions, types and events shared by every script run
//! against one engine instance, plus the global variable store.
//!
//! The registry is handed by reference to every entry point instead of living
//! in a process-wide static, so hosts and tests can keep several isolated
//! engines side by side. Tables use interior mutability: scripts register
//! functions and handlers while other scripts are running, and no borrow is
//! held across a call back into script code.

use std::{
    cell::{RefCell, RefMut},
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    ast::{Node, Script},
    config::EngineConfig,
    context::{Context, ContextRef},
    diagnostics::{Result, SkribeError},
    logging::{Logger, TracingLogger},
    parser,
    preprocessor::Preprocessor,
    runtime,
    stdlib,
    value::{Value, ValueKind},
};

pub type NativeFn = Rc<dyn Fn(&Registry, &[Value]) -> Result<Value>>;

/// Converts an argument into the representation a type expects. The error is
/// a human readable cause.
pub type Coercion = Rc<dyn Fn(&Value) -> std::result::Result<Value, String>>;

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub optional: bool,
    pub default: Value,
}

impl Parameter {
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            default: Value::null(),
        }
    }

    pub fn optional(name: impl Into<String>, type_name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: true,
            default,
        }
    }
}

#[derive(Clone)]
pub struct TypeDef {
    name: String,
    coercion: Coercion,
}

impl TypeDef {
    pub fn new<F>(name: impl Into<String>, coercion: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, String> + 'static,
    {
        Self {
            name: name.into(),
            coercion: Rc::new(coercion),
        }
    }

    /// A type accepting only host objects that report `name` as their type.
    pub fn host(name: impl Into<String>) -> Self {
        let name = name.into();
        let expected = name.clone();
        Self::new(name, move |value| match value.kind() {
            ValueKind::Object(object) if object.borrow().type_name() == expected => {
                Ok(value.clone())
            }
            _ => Err(format!("expected {expected}, found {}", value.type_name())),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Null passes through every type unchanged.
    pub fn coerce(&self, value: &Value) -> std::result::Result<Value, String> {
        if value.is_null() {
            return Ok(Value::null());
        }
        (self.coercion)(value)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef").field("name", &self.name).finish()
    }
}

#[derive(Clone)]
pub enum FunctionBody {
    Native(NativeFn),
    Script { body: Rc<Node>, closure: ContextRef },
}

#[derive(Clone)]
pub struct Function {
    name: String,
    parameters: Vec<Parameter>,
    body: FunctionBody,
}

impl Function {
    pub fn native<F>(name: impl Into<String>, parameters: Vec<Parameter>, implementation: F) -> Self
    where
        F: Fn(&Registry, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: name.into(),
            parameters,
            body: FunctionBody::Native(Rc::new(implementation)),
        }
    }

    /// A script-defined function. Every parameter is required and typed `object`.
    pub fn script(
        name: impl Into<String>,
        params: &[String],
        body: Rc<Node>,
        closure: ContextRef,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: params
                .iter()
                .map(|param| Parameter::required(param.clone(), "object"))
                .collect(),
            body: FunctionBody::Script { body, closure },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Checks arity, fills defaults, coerces every argument and then runs the
    /// implementation.
    pub fn invoke(&self, registry: &Registry, mut args: Vec<Value>) -> Result<Value> {
        let required = self.parameters.iter().filter(|p| !p.optional).count();
        if args.len() < required {
            return Err(SkribeError::TooFewArguments {
                function: self.name.clone(),
                required,
                received: args.len(),
            });
        }
        if args.len() > self.parameters.len() {
            return Err(SkribeError::TooManyArguments {
                function: self.name.clone(),
                accepted: self.parameters.len(),
                received: args.len(),
            });
        }
        for param in &self.parameters[args.len()..] {
            args.push(param.default.clone());
        }

        let mut coerced = Vec::with_capacity(args.len());
        for (param, arg) in self.parameters.iter().zip(args) {
            let type_def =
                registry
                    .type_def(&param.type_name)
                    .ok_or_else(|| SkribeError::UnknownType {
                        type_name: param.type_name.clone(),
                        parameter: param.name.clone(),
                    })?;
            let value = type_def
                .coerce(&arg)
                .map_err(|cause| SkribeError::TypeCoercion {
                    parameter: param.name.clone(),
                    value: arg.to_string(),
                    type_name: param.type_name.clone(),
                    cause,
                })?;
            coerced.push(value);
        }

        match &self.body {
            FunctionBody::Native(implementation) => implementation(registry, &coerced),
            FunctionBody::Script { body, closure } => {
                let names: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
                runtime::call_script_function(registry, &names, body, closure, coerced)
            }
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            FunctionBody::Native(_) => "native",
            FunctionBody::Script { .. } => "script",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("kind", &kind)
            .finish()
    }
}

/// A script body bound to the context it was registered in.
#[derive(Debug, Clone)]
pub struct Handler {
    pub script: Script,
    pub context: ContextRef,
}

#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    parameters: Vec<Parameter>,
    handlers: Vec<Handler>,
}

impl Event {
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
            handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }
}

pub struct Registry {
    functions: RefCell<IndexMap<String, Rc<Function>>>,
    types: RefCell<IndexMap<String, Rc<TypeDef>>>,
    events: RefCell<IndexMap<String, Event>>,
    globals: ContextRef,
    logger: Rc<dyn Logger>,
    preprocessor: RefCell<Preprocessor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Rc::new(TracingLogger))
    }
}

impl Registry {
    /// Built-in types and functions, reporting through `logger`.
    pub fn new(logger: Rc<dyn Logger>) -> Self {
        let registry = Self::bare(logger);
        stdlib::install_functions(&registry);
        registry
    }

    /// Built-in types only; no functions.
    pub fn bare(logger: Rc<dyn Logger>) -> Self {
        let registry = Self {
            functions: RefCell::new(IndexMap::new()),
            types: RefCell::new(IndexMap::new()),
            events: RefCell::new(IndexMap::new()),
            globals: Context::new(),
            logger,
            preprocessor: RefCell::new(Preprocessor::new()),
        };
        stdlib::install_types(&registry);
        registry
    }

    pub fn from_config(config: &EngineConfig, logger: Rc<dyn Logger>) -> Self {
        if config.register_builtins {
            Self::new(logger)
        } else {
            Self::bare(logger)
        }
    }

    pub fn logger(&self) -> &Rc<dyn Logger> {
        &self.logger
    }

    pub fn preprocessor_mut(&self) -> RefMut<'_, Preprocessor> {
        self.preprocessor.borrow_mut()
    }

    /// Registers a native function, replacing any function with the same name.
    pub fn register_function<F>(&self, name: &str, parameters: Vec<Parameter>, implementation: F)
    where
        F: Fn(&Registry, &[Value]) -> Result<Value> + 'static,
    {
        self.define_function(Function::native(name, parameters, implementation));
    }

    pub fn define_function(&self, function: Function) {
        tracing::debug!(target: "skribe", function = function.name(), "registering function");
        self.functions
            .borrow_mut()
            .insert(function.name.clone(), Rc::new(function));
    }

    pub fn function(&self, name: &str) -> Option<Rc<Function>> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let function = self
            .function(name)
            .ok_or_else(|| SkribeError::UnknownFunction {
                name: name.to_string(),
            })?;
        function.invoke(self, args)
    }

    pub fn register_type(&self, type_def: TypeDef) {
        tracing::debug!(target: "skribe", type_name = type_def.name(), "registering type");
        self.types
            .borrow_mut()
            .insert(type_def.name.clone(), Rc::new(type_def));
    }

    pub fn type_def(&self, name: &str) -> Option<Rc<TypeDef>> {
        self.types.borrow().get(name).cloned()
    }

    /// Declares an event. Re-registering a name replaces its parameters and
    /// keeps the handlers already attached.
    pub fn register_event(&self, name: &str, parameters: Vec<Parameter>) {
        tracing::debug!(target: "skribe", event = name, "registering event");
        let mut events = self.events.borrow_mut();
        match events.get_mut(name) {
            Some(event) => event.parameters = parameters,
            None => {
                events.insert(name.to_string(), Event::new(name, parameters));
            }
        }
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.borrow().contains_key(name)
    }

    pub fn event(&self, name: &str) -> Option<Event> {
        self.events.borrow().get(name).cloned()
    }

    pub fn register_handler(&self, event: &str, script: Script, context: ContextRef) -> Result<()> {
        let mut events = self.events.borrow_mut();
        let entry = events
            .get_mut(event)
            .ok_or_else(|| SkribeError::UnknownEvent {
                name: event.to_string(),
            })?;
        entry.handlers.push(Handler { script, context });
        tracing::debug!(target: "skribe", event, handlers = entry.handlers.len(), "handler registered");
        Ok(())
    }

    /// Removes the handler registered with exactly this script and context.
    pub fn unregister_handler(&self, event: &str, script: &Script, context: &ContextRef) -> bool {
        let mut events = self.events.borrow_mut();
        let Some(entry) = events.get_mut(event) else {
            return false;
        };
        let before = entry.handlers.len();
        entry
            .handlers
            .retain(|h| !(h.script.ptr_eq(script) && Rc::ptr_eq(&h.context, context)));
        entry.handlers.len() != before
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .get(event)
            .map_or(0, |entry| entry.handlers.len())
    }

    /// Runs every handler of `name` in registration order. Each handler sees
    /// the arguments bound by parameter name in its captured context. A
    /// failing handler is logged and the remaining handlers still run.
    pub fn trigger_event(&self, name: &str, args: Vec<Value>) -> Result<()> {
        let (parameters, handlers) = {
            let events = self.events.borrow();
            let event = events.get(name).ok_or_else(|| SkribeError::UnknownEvent {
                name: name.to_string(),
            })?;
            (event.parameters.clone(), event.handlers.clone())
        };
        if args.len() != parameters.len() {
            return Err(SkribeError::ArgumentCountMismatch {
                event: name.to_string(),
                expected: parameters.len(),
                received: args.len(),
            });
        }

        tracing::debug!(target: "skribe", event = name, handlers = handlers.len(), "triggering event");
        for handler in handlers {
            {
                let mut context = handler.context.borrow_mut();
                for (param, arg) in parameters.iter().zip(&args) {
                    context.set(&param.name, arg.clone());
                }
            }
            if let Err(err) = self.execute_script(&handler.script, &handler.context) {
                self.logger
                    .error(&format!("handler for event `{name}` failed: {err}"));
            }
        }
        Ok(())
    }

    /// Drops every event handler. Functions, types, events and globals stay.
    pub fn flush(&self) {
        let mut events = self.events.borrow_mut();
        for event in events.values_mut() {
            event.handlers.clear();
        }
        tracing::debug!(target: "skribe", events = events.len(), "event handlers flushed");
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        Context::get(&self.globals, name)
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.globals.borrow_mut().set(name, value);
    }

    /// Resolves `name` through the context chain, then the global store.
    pub fn lookup(&self, context: &ContextRef, name: &str) -> Option<Value> {
        Context::get(context, name).or_else(|| self.global(name))
    }

    pub fn parse(&self, source: &str) -> Result<Script> {
        let preprocessor = self.preprocessor.borrow();
        parser::parse(source, &preprocessor)
    }

    /// Parses and runs `source`. Without a context the script runs in a
    /// fresh root context.
    pub fn execute(&self, source: &str, context: Option<&ContextRef>) -> Result<Value> {
        let script = self.parse(source)?;
        match context {
            Some(context) => self.execute_script(&script, context),
            None => self.execute_script(&script, &Context::new()),
        }
    }

    pub fn execute_script(&self, script: &Script, context: &ContextRef) -> Result<Value> {
        runtime::run_script(self, script, context)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.functions.borrow().keys().collect::<Vec<_>>())
            .field("types", &self.types.borrow().keys().collect::<Vec<_>>())
            .field("events", &self.events.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
