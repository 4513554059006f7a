use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    context::{Context, ContextRef},
    diagnostics::{Result, SkribeError},
    registry::Registry,
};

/// Interactive session. Every line runs in the same root context, so
/// variables and handlers persist between lines.
pub struct Repl {
    registry: Registry,
    context: ContextRef,
}

impl Repl {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            context: Context::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        loop {
            match editor.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    match trimmed {
                        ":quit" | ":exit" => break,
                        "" => continue,
                        ":flush" => {
                            self.registry.flush();
                            println!("event handlers cleared");
                            continue;
                        }
                        _ => {}
                    }
                    editor.add_history_entry(trimmed).ok();
                    match self.registry.execute(trimmed, Some(&self.context)) {
                        Ok(value) if value.is_null() => {}
                        Ok(value) => println!("{value}"),
                        Err(err) => eprintln!("error: {err}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(readline_error(err)),
            }
        }
        Ok(())
    }
}

fn readline_error(err: ReadlineError) -> SkribeError {
    SkribeError::from(std::io::Error::other(err))
}
