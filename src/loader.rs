//! Loads script files from a directory into a registry.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{context::Context, diagnostics::Result, registry::Registry};

/// Outcome of a directory load. Failed files do not stop the load.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parses and runs one file in a fresh root context.
pub fn load_file(registry: &Registry, path: impl AsRef<Path>) -> Result<()> {
    let source = fs::read_to_string(path)?;
    registry.execute(&source, Some(&Context::new()))?;
    Ok(())
}

/// Runs every `*.{extension}` file directly inside `dir`, in path order.
pub fn load_directory(registry: &Registry, dir: impl AsRef<Path>, extension: &str) -> Result<LoadReport> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();

    let mut report = LoadReport::default();
    for path in files {
        tracing::debug!(target: "skribe", path = %path.display(), "loading script");
        match load_file(registry, &path) {
            Ok(()) => report.loaded.push(path),
            Err(err) => report.failed.push((path, err.to_string())),
        }
    }
    log_summary(registry, &report);
    Ok(report)
}

/// Drops every event handler and loads the directory again.
pub fn reload(registry: &Registry, dir: impl AsRef<Path>, extension: &str) -> Result<LoadReport> {
    registry.flush();
    load_directory(registry, dir, extension)
}

fn log_summary(registry: &Registry, report: &LoadReport) {
    let logger = registry.logger();
    let (successes, failures) = (report.loaded.len(), report.failed.len());
    if failures == 0 {
        logger.info(&format!("all {} scripts loaded successfully", report.total()));
    } else if successes == 0 {
        logger.error("no scripts loaded successfully");
    } else {
        logger.warning("only some scripts loaded successfully");
    }
    logger.info(&format!("successful: {successes}, failures: {failures}"));
    for (path, reason) in &report.failed {
        logger.warning(&format!("failed script: {}, reason: {reason}", path.display()));
    }
}
