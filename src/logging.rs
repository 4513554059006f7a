use std::{cell::RefCell, fmt};

/// Destination for messages the engine reports while recovering from errors,
/// such as a failing event handler.
pub trait Logger {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `skribe` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "skribe", "{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: "skribe", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "skribe", "{message}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// Keeps every message in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn record(&self, level: LogLevel, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }
}
