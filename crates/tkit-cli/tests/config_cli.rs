//! Integration tests for configuration loading and the `tkit config` commands.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{tkit_cmd, write_config};

#[test]
fn test_config_check_missing_file() {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().join("absent.yaml");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in defaults apply"));
}

#[test]
fn test_config_check_valid_file() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "color: never\nstatus:\n  columnWidth: 30\n");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ok] Configuration is valid"));
}

#[test]
fn test_config_check_reports_warnings() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "status:\n  columnWidth: 0\n");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warn] 1 warning(s):"))
        .stdout(predicate::str::contains("columnWidth=0"));
}

#[test]
fn test_config_check_unknown_color() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "status:\n  failure:\n    text: BAD\n    color: mauve\n");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "config", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[err] Configuration is invalid"))
        .stdout(predicate::str::contains("Unknown color `mauve`"))
        .stdout(predicate::str::contains("[hint]"));
}

#[test]
fn test_invalid_fill_char_blocks_commands() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "status:\n  fillChar: \"..\"\n");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "colors"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"))
        .stderr(predicate::str::contains("single character"))
        .stderr(predicate::str::contains("Hint: Check your config at"));
}

#[test]
fn test_invalid_yaml_blocks_commands() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "status: [unclosed");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["msg", "info", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config invalid"));
}

#[test]
fn test_config_color_applies_without_flag() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "color: always\n");

    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["msg", "info", "hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b["));

    // The flag wins over the file.
    tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["--color", "never", "msg", "info", "hi"])
        .assert()
        .success()
        .stdout("[ INFO ]  hi\n");
}

#[test]
fn test_config_env_var() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "prefix:\n  indentWidth: 4\n");

    tkit_cmd()
        .env("TKIT_CONFIG", &path)
        .args(["--color", "never", "msg", "ok", "spaced"])
        .assert()
        .success()
        .stdout("[  OK  ]    spaced\n");
}

#[test]
fn test_config_show_json() {
    let temp = TempDir::new().expect("create temp dir");
    let path = write_config(temp.path(), "status:\n  columnWidth: 24\n");

    let output = tkit_cmd()
        .arg("--config")
        .arg(&path)
        .args(["config", "show", "--json"])
        .output()
        .expect("run tkit config show");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["status"]["columnWidth"], 24);
    assert_eq!(value["status"]["fillChar"], ".");
    assert_eq!(value["status"]["success"]["text"], "[DONE]");
    assert_eq!(value["prefix"]["indentWidth"], 2);
    assert_eq!(value["failure"]["waitForAck"], true);
}

#[test]
fn test_config_show_human() {
    tkit_cmd()
        .args(["--color", "never", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CONFIG\n"))
        .stdout(predicate::str::contains("Column width: 40"))
        .stdout(predicate::str::contains("Success: [DONE] (green)"))
        .stdout(predicate::str::contains("Wait for ack: yes"));
}
