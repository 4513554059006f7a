use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn skribe() -> Command {
    let mut cmd = Command::cargo_bin("skribe").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn skribe_run_quickstart() {
    skribe()
        .arg("run")
        .arg("demos/quickstart.skribe")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello from Skribe!"))
        .stdout(predicate::str::contains("total is 10"))
        .stdout(predicate::str::contains("5! = 120"));
}

#[test]
fn skribe_eval_prints_result() {
    skribe()
        .arg("eval")
        .arg("set total to 2 plus 3 times 4")
        .assert()
        .success()
        .stdout(predicate::str::contains("14"));
}

#[test]
fn skribe_eval_reports_errors() {
    skribe()
        .arg("eval")
        .arg("undefined_thing + 1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("`undefined_thing` is not defined"));
}

#[test]
fn skribe_load_directory() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("hello.skribe"), "print(\"loaded hello\")").expect("write script");
    fs::write(dir.path().join("other.skribe"), "print(\"loaded other\")").expect("write script");

    skribe()
        .arg("load")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded hello"))
        .stdout(predicate::str::contains("loaded 2 of 2 scripts"));
}

#[test]
fn skribe_load_uses_configured_extension() {
    let dir = tempdir().expect("create temp dir");
    let scripts = dir.path().join("scripts");
    fs::create_dir(&scripts).expect("create scripts dir");
    fs::write(scripts.join("one.sk"), "print(\"custom extension\")").expect("write script");
    fs::write(scripts.join("two.skribe"), "print(\"ignored\")").expect("write script");

    let config = dir.path().join("skribe.json");
    let config_json = serde_json::json!({
        "script_dir": scripts,
        "extension": "sk",
    });
    fs::write(&config, config_json.to_string()).expect("write config");

    skribe()
        .arg("--config")
        .arg(&config)
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains("custom extension"))
        .stdout(predicate::str::contains("ignored").not());
}

#[test]
fn skribe_load_failure_exits_nonzero() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("broken.skribe"), "var = 1").expect("write script");

    skribe()
        .arg("load")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("loaded 0 of 1 scripts"));
}
