use std::{fs, rc::Rc};

use skribe::{LogLevel, MemoryLogger, Parameter, Registry, SkribeError, Value, loader};
use tempfile::tempdir;

fn registry_with_logger() -> (Registry, Rc<MemoryLogger>) {
    let logger = Rc::new(MemoryLogger::new());
    let registry = Registry::new(logger.clone());
    registry.register_event("tick", vec![Parameter::required("value", "number")]);
    (registry, logger)
}

#[test]
fn loads_every_matching_file_in_order() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("b_second.skribe"), "function second() { return 2 }")
        .expect("write script");
    fs::write(dir.path().join("a_first.skribe"), "function first() { return 1 }")
        .expect("write script");
    fs::write(dir.path().join("notes.txt"), "this is not a script (").expect("write notes");

    let (registry, logger) = registry_with_logger();
    let report = loader::load_directory(&registry, dir.path(), "skribe").expect("load");

    assert!(report.is_success());
    assert_eq!(report.total(), 2);
    let names: Vec<_> = report
        .loaded
        .iter()
        .map(|path| path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["a_first.skribe", "b_second.skribe"]);
    assert!(registry.function("first").is_some());
    assert!(registry.function("second").is_some());
    assert!(
        logger
            .messages(LogLevel::Info)
            .iter()
            .any(|m| m.contains("all 2 scripts loaded successfully"))
    );
}

#[test]
fn failures_are_collected_and_logged() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("good.skribe"), "set greeting to \"hi\"").expect("write script");
    fs::write(dir.path().join("broken.skribe"), "var x = (1 +").expect("write script");

    let (registry, logger) = registry_with_logger();
    let report = loader::load_directory(&registry, dir.path(), "skribe").expect("load");

    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("broken.skribe"));
    assert!(report.failed[0].1.contains("syntax error"));
    assert!(
        logger
            .messages(LogLevel::Warning)
            .iter()
            .any(|m| m.contains("only some scripts loaded successfully"))
    );
    assert!(
        logger
            .messages(LogLevel::Warning)
            .iter()
            .any(|m| m.contains("broken.skribe"))
    );
}

#[test]
fn all_failures_log_an_error() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("broken.skribe"), "missing()").expect("write script");

    let (registry, logger) = registry_with_logger();
    let report = loader::load_directory(&registry, dir.path(), "skribe").expect("load");

    assert!(!report.is_success());
    assert_eq!(
        logger.messages(LogLevel::Error),
        vec!["no scripts loaded successfully".to_string()]
    );
}

#[test]
fn each_file_runs_in_its_own_context() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("a.skribe"), "var secret = 1").expect("write script");
    fs::write(dir.path().join("b.skribe"), "secret").expect("write script");

    let (registry, _) = registry_with_logger();
    let report = loader::load_directory(&registry, dir.path(), "skribe").expect("load");

    assert_eq!(report.loaded.len(), 1);
    assert!(report.failed[0].1.contains("secret"));
}

#[test]
fn reload_replaces_handlers() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("events.skribe");
    fs::write(&script, "on tick print(\"tick \" + value)").expect("write script");

    let (registry, logger) = registry_with_logger();
    loader::load_directory(&registry, dir.path(), "skribe").expect("load");
    assert_eq!(registry.handler_count("tick"), 1);

    loader::reload(&registry, dir.path(), "skribe").expect("reload");
    assert_eq!(registry.handler_count("tick"), 1);

    logger.clear();
    registry
        .trigger_event("tick", vec![Value::number(1.0)])
        .expect("trigger");
    assert_eq!(logger.messages(LogLevel::Info), vec!["tick 1".to_string()]);
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = tempdir().expect("create temp dir");
    let (registry, _) = registry_with_logger();
    let result = loader::load_directory(&registry, dir.path().join("absent"), "skribe");
    assert!(matches!(result, Err(SkribeError::Io(_))));
}

#[test]
fn load_file_reports_errors() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("single.skribe");
    fs::write(&path, "on nowhere { 1 }").expect("write script");

    let (registry, _) = registry_with_logger();
    assert!(matches!(
        loader::load_file(&registry, &path),
        Err(SkribeError::UnknownEvent { .. })
    ));
}
