use std::rc::Rc;

use crate::value::Value;

/// A node of the syntax tree. Statements and expressions share one type: every
/// node evaluates to a value.
#[derive(Debug, Clone)]
pub enum Node {
    Literal(Value),
    /// A possibly dotted name such as `player.Position.X`.
    Variable(String),
    Assignment {
        name: String,
        value: Box<Node>,
    },
    Binary {
        left: Box<Node>,
        operator: String,
        right: Box<Node>,
    },
    Unary {
        operator: String,
        operand: Box<Node>,
    },
    Block(Vec<Node>),
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    For {
        init: Box<Node>,
        condition: Box<Node>,
        increment: Box<Node>,
        body: Box<Node>,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Rc<Node>,
    },
    Return(Box<Node>),
    Call {
        name: String,
        args: Vec<Node>,
    },
    EventHandler {
        event: String,
        body: Rc<Node>,
    },
    Trigger {
        event: String,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn null() -> Self {
        Node::Literal(Value::null())
    }
}

/// A parsed, executable program. Cloning shares the underlying tree, so a
/// script retained as an event handler costs one reference count.
#[derive(Debug, Clone)]
pub struct Script {
    root: Rc<Node>,
}

impl Script {
    pub fn new(root: Node) -> Self {
        Self {
            root: Rc::new(root),
        }
    }

    pub fn from_shared(root: Rc<Node>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn ptr_eq(&self, other: &Script) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }
}
