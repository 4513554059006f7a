use std::{fs, path::PathBuf, rc::Rc};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use skribe::{
    EngineConfig, Parameter, Registry, Repl, SkribeError, TracingLogger, Value, loader,
};

#[derive(Parser)]
#[command(author, version, about = "Skribe scripting engine")]
struct Args {
    /// JSON engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log engine activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Skribe script file
    Run { script: PathBuf },
    /// Evaluate a snippet of Skribe code and print its result
    Eval { source: String },
    /// Load every script in a directory
    Load { dir: Option<PathBuf> },
    /// Start an interactive REPL session
    Repl,
}

fn main() {
    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), SkribeError> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    init_tracing(&config, args.verbose);

    let registry = Registry::from_config(&config, Rc::new(TracingLogger));
    if config.register_builtins {
        registry.register_function(
            "print",
            vec![Parameter::required("message", "text")],
            |_, args| {
                match args.first() {
                    Some(value) if !value.is_null() => println!("{value}"),
                    _ => println!(),
                }
                Ok(Value::null())
            },
        );
    }

    match args.command.unwrap_or(Command::Repl) {
        Command::Run { script } => {
            let source = fs::read_to_string(&script)?;
            registry.execute(&source, None)?;
            Ok(())
        }
        Command::Eval { source } => {
            let value = registry.execute(&source, None)?;
            if !value.is_null() {
                println!("{value}");
            }
            Ok(())
        }
        Command::Load { dir } => {
            let dir = dir.unwrap_or_else(|| config.script_dir.clone());
            let report = loader::load_directory(&registry, &dir, &config.extension)?;
            println!(
                "loaded {} of {} scripts from {}",
                report.loaded.len(),
                report.total(),
                dir.display()
            );
            if report.is_success() {
                Ok(())
            } else {
                std::process::exit(2);
            }
        }
        Command::Repl => Repl::new(registry).run(),
    }
}

/// Logs go to stderr so script output owns stdout. `RUST_LOG` wins over the
/// configured filter.
fn init_tracing(config: &EngineConfig, verbose: bool) {
    let fallback = if verbose { "debug" } else { config.log_filter.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
