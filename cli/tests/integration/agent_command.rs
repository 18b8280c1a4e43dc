//! Integration tests for `claw agent add`.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const POD: &str = "x-claw:
  pod: desk
services:
  trader:
    image: desk-trader:latest
    x-claw:
      agent: ./agents/trader/AGENTS.md
";

fn pod_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("claw-pod.yml"), POD).expect("write pod");
    dir
}

fn claw_in(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claw"));
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env("CLAW_CONFIG", dir.path().join("config.yaml"));
    cmd
}

#[test]
fn test_agent_add_dry_run_prints_plan_and_writes_nothing() {
    let dir = pod_dir();
    claw_in(&dir)
        .args(["agent", "add", "analyst", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("planned changes"))
        .stdout(predicate::str::contains("agents/analyst/Clawfile"));

    assert!(!dir.path().join("agents/analyst").exists());
    let pod = std::fs::read_to_string(dir.path().join("claw-pod.yml")).expect("read pod");
    assert_eq!(pod, POD);
}

#[test]
fn test_agent_add_scaffolds_agent_directory() {
    let dir = pod_dir();
    claw_in(&dir)
        .args(["agent", "add", "analyst", "--platform", "none"])
        .assert()
        .success();

    assert!(dir.path().join("agents/analyst/Clawfile").is_file());
    assert!(dir.path().join("agents/analyst/AGENTS.md").is_file());
    assert!(dir.path().join("agents/analyst/skills").is_dir());
    let pod = std::fs::read_to_string(dir.path().join("claw-pod.yml")).expect("read pod");
    assert!(pod.contains("  analyst:\n"));
}

#[test]
fn test_agent_add_json_reports_outcome() {
    let dir = pod_dir();
    let assert = claw_in(&dir)
        .args(["--json", "agent", "add", "analyst", "--dry-run"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(v["agent"], "analyst");
    assert_eq!(v["clawType"], "openclaw");
    assert_eq!(v["written"], false);
}

#[test]
fn test_agent_add_rewire_from_requires_shared() {
    let dir = pod_dir();
    claw_in(&dir)
        .args(["agent", "add", "analyst", "--rewire-from", "./agents/trader/AGENTS.md"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--shared"));
}

#[test]
fn test_agent_add_unknown_type_is_rejected() {
    let dir = pod_dir();
    claw_in(&dir)
        .args(["agent", "add", "analyst", "--type", "hermitclaw", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hermitclaw"));
}
