//! Tests for the `health` application service.

#![allow(clippy::expect_used)]

use std::path::Path;

use clawdapus_cli::application::ports::ExecOutput;
use clawdapus_cli::application::services::health::check_health;
use clawdapus_cli::drivers::DriverRegistry;

use crate::helpers::FakeEngine;

const COMPOSE: &str = "/pod/compose.generated.yml";

#[tokio::test]
async fn test_check_health_routes_claw_containers_to_driver_probe() {
    let mut engine = FakeEngine::default().with_container(
        "bot",
        "0123456789abcdef",
        &[("claw.type", "openclaw"), ("claw.service", "bot")],
        true,
    );
    engine.exec_replies.insert(
        "0123456789abcdef".into(),
        ExecOutput {
            exit_code: 0,
            stdout: br#"plugin banner {"status":"ok","detail":"gateway up"}"#.to_vec(),
            stderr: Vec::new(),
        },
    );

    let rows = check_health(&engine, &DriverRegistry::with_builtin(), Path::new(COMPOSE))
        .await
        .expect("health");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].service, "bot");
    assert_eq!(rows[0].status, "healthy");
    assert_eq!(rows[0].detail, "gateway up");
    assert!(engine.calls().contains(&"exec 0123456789abcdef openclaw health --json".to_string()));
}

#[tokio::test]
async fn test_check_health_native_container_reports_engine_state() {
    let engine = FakeEngine::default().with_container(
        "db",
        "feedfacecafe0000",
        &[("com.docker.compose.service", "db")],
        true,
    );

    let rows = check_health(&engine, &DriverRegistry::with_builtin(), Path::new(COMPOSE))
        .await
        .expect("health");

    assert_eq!(rows[0].service, "db");
    assert_eq!(rows[0].status, "running");
    assert_eq!(rows[0].detail, "native (no claw driver)");
}

#[tokio::test]
async fn test_check_health_unknown_driver_is_error_row() {
    let engine = FakeEngine::default().with_container(
        "bot",
        "aaaaaaaaaaaaaaaa",
        &[("claw.type", "mysteryclaw"), ("claw.service", "bot")],
        true,
    );

    let rows = check_health(&engine, &DriverRegistry::with_builtin(), Path::new(COMPOSE))
        .await
        .expect("health");

    assert_eq!(rows[0].status, "error");
    assert_eq!(rows[0].detail, "unknown driver: mysteryclaw");
}

#[tokio::test]
async fn test_check_health_inspect_failure_uses_short_id() {
    let mut engine = FakeEngine::default();
    engine.ps_ids.insert(String::new(), vec!["0123456789abcdef0000".into()]);

    let rows = check_health(&engine, &DriverRegistry::with_builtin(), Path::new(COMPOSE))
        .await
        .expect("health");

    assert_eq!(rows[0].service, "0123456789ab");
    assert_eq!(rows[0].status, "error");
    assert!(rows[0].detail.starts_with("inspect failed:"));
}

#[tokio::test]
async fn test_check_health_stopped_nullclaw_is_unhealthy() {
    let engine = FakeEngine::default().with_container(
        "tiny",
        "bbbbbbbbbbbbbbbb",
        &[("claw.type", "nullclaw"), ("claw.service", "tiny")],
        false,
    );

    let rows = check_health(&engine, &DriverRegistry::with_builtin(), Path::new(COMPOSE))
        .await
        .expect("health");

    assert_eq!(rows[0].status, "unhealthy");
    assert_eq!(rows[0].detail, "not running (exited)");
}
