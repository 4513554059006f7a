//! Skribe: an embeddable scripting engine with a natural-language front end.
//! Hosts register native functions, value types and events on a [`Registry`]
//! and run designer-authored scripts against it.

pub mod ast;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod lexer;
pub mod loader;
pub mod logging;
pub mod parser;
pub mod preprocessor;
pub mod registry;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use ast::{Node, Script};
pub use config::EngineConfig;
pub use context::{Context, ContextRef};
pub use diagnostics::{Result, SkribeError, SourcePosition};
pub use loader::LoadReport;
pub use logging::{LogLevel, Logger, MemoryLogger, TracingLogger};
pub use preprocessor::Preprocessor;
pub use registry::{Event, Function, Parameter, Registry, TypeDef};
pub use repl::Repl;
pub use value::{HostObject, Value, ValueKind};
