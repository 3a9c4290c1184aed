//! Shared test utilities for tkit-cli integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get a Command for the tkit binary.
///
/// The command points `TKIT_CONFIG` at a file that does not exist, so the
/// developer's own `~/.tkit/config.yaml` never leaks into a test, and clears
/// the other `TKIT_*` variables.
///
/// # Panics
///
/// Panics if the tkit binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn tkit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tkit").expect("tkit binary should exist");
    cmd.env("TKIT_CONFIG", missing_config_path())
        .env_remove("TKIT_COLOR")
        .env_remove("TKIT_VERBOSE")
        .env_remove("RUST_BACKTRACE");
    cmd
}

/// Path of the tkit binary, for use as the child of `tkit run`.
#[allow(deprecated)]
pub fn tkit_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("tkit")
}

/// Write `content` to `config.yaml` inside `dir` and return its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, content).expect("write config");
    path
}

fn missing_config_path() -> PathBuf {
    std::env::temp_dir()
        .join("tkit-cli-tests-absent")
        .join("config.yaml")
}
