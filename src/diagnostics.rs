use std::fmt;

use thiserror::Error;

/// A 1-based line/column location within preprocessed script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Renders an optional position for syntax errors raised at end of input.
struct At<'a>(&'a Option<SourcePosition>);

impl fmt::Display for At<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {position}"),
            None => Ok(()),
        }
    }
}

/// Unified error type for the Skribe engine.
#[derive(Debug, Error)]
pub enum SkribeError {
    #[error("lexical error at {position}: {message}")]
    Lexical {
        message: String,
        position: SourcePosition,
    },
    #[error("syntax error{}: {message}", At(.position))]
    Syntax {
        message: String,
        position: Option<SourcePosition>,
    },
    #[error("variable `{name}` is not defined")]
    UndefinedVariable { name: String },
    #[error("no member `{member}` on {type_name}")]
    NoSuchMember { member: String, type_name: String },
    #[error("cannot access `{member}` on null")]
    NullMemberAccess { member: String },
    #[error("unknown operator `{operator}`")]
    UnknownOperator { operator: String },
    #[error("operator `{operator}` is not supported between {left} and {right}")]
    UnsupportedOperator {
        operator: String,
        left: String,
        right: String,
    },
    #[error("function `{name}` is not defined")]
    UnknownFunction { name: String },
    #[error("unknown type `{type_name}` for parameter `{parameter}`")]
    UnknownType {
        type_name: String,
        parameter: String,
    },
    #[error("event `{name}` is not defined")]
    UnknownEvent { name: String },
    #[error("function `{function}` requires at least {required} arguments, but got {received}")]
    TooFewArguments {
        function: String,
        required: usize,
        received: usize,
    },
    #[error("function `{function}` accepts at most {accepted} arguments, but got {received}")]
    TooManyArguments {
        function: String,
        accepted: usize,
        received: usize,
    },
    #[error("cannot convert argument `{parameter}` ({value}) to `{type_name}`: {cause}")]
    TypeCoercion {
        parameter: String,
        value: String,
        type_name: String,
        cause: String,
    },
    #[error("event `{event}` requires {expected} arguments, but got {received}")]
    ArgumentCountMismatch {
        event: String,
        expected: usize,
        received: usize,
    },
    #[error("`{function}` failed: {message}")]
    Native { function: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl SkribeError {
    pub fn lexical(message: impl Into<String>, position: SourcePosition) -> Self {
        Self::Lexical {
            message: message.into(),
            position,
        }
    }

    pub fn syntax(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Error for host functions that reject their (already coerced) arguments.
    pub fn native(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Native {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Location of a lexical or syntax error, if any.
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::Lexical { position, .. } => Some(*position),
            Self::Syntax { position, .. } => *position,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SkribeError>;
