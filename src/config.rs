//! Engine settings read from a JSON file.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostics::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Directory scanned by the script loader.
    #[serde(default = "default_script_dir")]
    pub script_dir: PathBuf,
    /// Script file extension, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// `tracing_subscriber` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_register_builtins")]
    pub register_builtins: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_dir: default_script_dir(),
            extension: default_extension(),
            log_filter: default_log_filter(),
            register_builtins: default_register_builtins(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

fn default_script_dir() -> PathBuf {
    PathBuf::from("./skribe")
}

fn default_extension() -> String {
    "skribe".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_register_builtins() -> bool {
    true
}
