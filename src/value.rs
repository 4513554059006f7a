use std::{any::Any, cell::RefCell, cmp::Ordering, fmt, rc::Rc};

/// A host-supplied value exposed to scripts.
///
/// Member paths such as `player.Health` resolve one segment at a time through
/// [`HostObject::get_member`]; assignments to a dotted path call
/// [`HostObject::set_member`] on the owner of the final segment.
pub trait HostObject: fmt::Debug {
    /// Name used in diagnostics and by [`crate::registry::TypeDef::host`].
    fn type_name(&self) -> &str;

    fn get_member(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Returns `false` when the member does not exist.
    fn set_member(&mut self, _name: &str, _value: Value) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type HostRef = Rc<RefCell<dyn HostObject>>;

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Null)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Boolean(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(ValueKind::Number(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Text(value.into()))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Self::new(ValueKind::List(values))
    }

    pub fn object<T: HostObject + 'static>(object: T) -> Self {
        Self::new(ValueKind::Object(Rc::new(RefCell::new(object))))
    }

    pub fn from_host(object: HostRef) -> Self {
        Self::new(ValueKind::Object(object))
    }

    pub fn kind(&self) -> &ValueKind {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        matches!(&*self.0, ValueKind::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match &*self.0 {
            ValueKind::Null => false,
            ValueKind::Boolean(b) => *b,
            ValueKind::Number(n) => *n != 0.0 && !n.is_nan(),
            ValueKind::Text(s) => !s.is_empty(),
            ValueKind::List(values) => !values.is_empty(),
            ValueKind::Object(_) => true,
        }
    }

    pub fn type_name(&self) -> String {
        match &*self.0 {
            ValueKind::Null => "null".into(),
            ValueKind::Boolean(_) => "boolean".into(),
            ValueKind::Number(_) => "number".into(),
            ValueKind::Text(_) => "text".into(),
            ValueKind::List(_) => "list".into(),
            ValueKind::Object(object) => object.borrow().type_name().to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match &*self.0 {
            ValueKind::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &*self.0 {
            ValueKind::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.0 {
            ValueKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &*self.0 {
            ValueKind::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostRef> {
        match &*self.0 {
            ValueKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Numeric view used by arithmetic operators: null is 0, booleans are
    /// 0/1 and numeric text is parsed.
    pub fn to_number(&self) -> Option<f64> {
        match &*self.0 {
            ValueKind::Null => Some(0.0),
            ValueKind::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            ValueKind::Number(n) => Some(*n),
            ValueKind::Text(s) => s.trim().parse().ok(),
            ValueKind::List(_) | ValueKind::Object(_) => None,
        }
    }

    /// Ordering between two values of a comparable kind.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (&*self.0, &*other.0) {
            (ValueKind::Number(a), ValueKind::Number(b)) => a.partial_cmp(b),
            (ValueKind::Text(a), ValueKind::Text(b)) => Some(a.cmp(b)),
            (ValueKind::Boolean(a), ValueKind::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (ValueKind::Null, ValueKind::Null) => true,
            (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a == b,
            (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
            (ValueKind::Text(a), ValueKind::Text(b)) => a == b,
            (ValueKind::List(a), ValueKind::List(b)) => a == b,
            (ValueKind::Object(a), ValueKind::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::text(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::text(value)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{b}"),
            ValueKind::Number(n) => write!(f, "{n}"),
            ValueKind::Text(s) => write!(f, "{s:?}"),
            ValueKind::List(values) => f.debug_list().entries(values.iter()).finish(),
            ValueKind::Object(object) => match object.try_borrow() {
                Ok(object) => write!(f, "{:?}", &*object),
                Err(_) => write!(f, "<object>"),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean(b) => write!(f, "{b}"),
            ValueKind::Number(n) => write!(f, "{n}"),
            ValueKind::Text(s) => write!(f, "{s}"),
            ValueKind::List(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            ValueKind::Object(_) => write!(f, "{self:?}"),
        }
    }
}

pub enum ValueKind {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Object(HostRef),
}
