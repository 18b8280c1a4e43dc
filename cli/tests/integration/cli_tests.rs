//! Integration tests for the claw CLI skeleton: help, version, and argument
//! parsing.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn claw() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claw"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    claw()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Governed containers for AI agents"));
}

#[test]
fn test_cli_help_lists_pipeline_commands() {
    let assert = claw().arg("--help").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    for verb in ["build", "up", "down", "ps", "logs", "health", "inspect", "doctor", "agent"] {
        assert!(stdout.contains(verb), "help is missing {verb}:\n{stdout}");
    }
}

#[test]
fn test_cli_version_flag_shows_binary_name() {
    claw()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("claw "));
}

#[test]
fn test_inspect_without_image_is_usage_error() {
    claw()
        .arg("inspect")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("<IMAGE>"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    claw().arg("launch").assert().code(2);
}

#[test]
fn test_up_help_shows_detach_and_file_flags() {
    claw()
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--detach"))
        .stdout(predicate::str::contains("--file"));
}
