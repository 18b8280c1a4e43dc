//! Tests for the `doctor` application service.

#![allow(clippy::expect_used)]

use clawdapus_cli::application::services::doctor::run_checks;
use clawdapus_cli::domain::health::collect_issues;

use crate::helpers::{FakeRunner, err_output, ok_output};

const VERSION: &str = "version --format {{.Client.Version}}";
const BUILDX: &str = "buildx version";
const COMPOSE: &str = "compose version --short";

#[tokio::test]
async fn test_run_checks_all_available_reports_versions() {
    let runner = FakeRunner::default()
        .reply(VERSION, ok_output(b"27.1.1\n"))
        .reply(BUILDX, ok_output(b"github.com/docker/buildx v0.16.1 abc\n"))
        .reply(COMPOSE, ok_output(b"2.29.1\n"));

    let checks = run_checks(&runner, "docker").await;

    let names: Vec<_> = checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["docker", "buildkit", "compose"]);
    assert!(checks.iter().all(|c| c.ok));
    assert_eq!(checks[0].version, "27.1.1");
    assert!(collect_issues(&checks).is_empty());
}

#[tokio::test]
async fn test_run_checks_failed_probe_carries_stderr() {
    let runner = FakeRunner::default()
        .reply(VERSION, ok_output(b"27.1.1\n"))
        .reply(BUILDX, err_output(1, b"docker: 'buildx' is not a docker command.\n"))
        .reply(COMPOSE, ok_output(b"2.29.1\n"));

    let checks = run_checks(&runner, "docker").await;

    assert!(!checks[1].ok);
    assert!(checks[1].detail.contains("is not a docker command"));
    assert_eq!(collect_issues(&checks).len(), 1);
}

#[tokio::test]
async fn test_run_checks_missing_binary_fails_every_check() {
    let runner = FakeRunner::default();

    let checks = run_checks(&runner, "podman").await;

    assert!(checks.iter().all(|c| !c.ok));
    assert!(checks[0].detail.contains("failed to spawn podman"));
    assert!(runner.calls.borrow().iter().all(|c| c.starts_with("podman ")));
}
