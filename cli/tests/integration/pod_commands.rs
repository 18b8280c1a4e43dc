//! Integration tests for pod lifecycle commands that fail before any engine
//! call is made.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `claw` running in `dir` with an isolated, absent operator config.
fn claw_in(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claw"));
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env("CLAW_CONFIG", dir.path().join("config.yaml"));
    cmd
}

#[test]
fn test_down_without_generated_compose_asks_for_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    claw_in(&dir)
        .arg("down")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 'claw up' first"));
}

#[test]
fn test_health_without_generated_compose_asks_for_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    claw_in(&dir)
        .args(["health", "-f", "pods/claw-pod.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no compose.generated.yml found"));
}

#[test]
fn test_build_missing_path_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    claw_in(&dir)
        .args(["build", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_build_directory_without_clawfile_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    claw_in(&dir)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Clawfile found"));
}

#[test]
fn test_json_mode_prints_error_object_on_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let assert = claw_in(&dir).args(["--json", "ps"]).assert().failure();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("json error object");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "command_failed");
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("config.yaml"), "images: [not, a, map]\n").expect("write");
    claw_in(&dir)
        .arg("ps")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.yaml"));
}
