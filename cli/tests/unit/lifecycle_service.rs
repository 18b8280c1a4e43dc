//! Tests for the `down`, `ps` and `logs` wrappers.

#![allow(clippy::expect_used)]

use clawdapus_cli::application::services::lifecycle::{COMPOSE_GENERATED, down, logs, ps};

use crate::helpers::FakeEngine;

fn pod_dir_with_generated() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("claw-pod.yml"), "services: {}\n").expect("pod");
    std::fs::write(dir.path().join(COMPOSE_GENERATED), "services: {}\n").expect("compose");
    dir
}

#[tokio::test]
async fn test_down_without_generated_file_tells_user_to_run_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = FakeEngine::default();

    let err = down(&engine, &dir.path().join("claw-pod.yml"))
        .await
        .expect_err("missing compose file");

    assert!(err.to_string().contains("run 'claw up' first"));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_down_and_ps_run_compose_on_generated_file() {
    let dir = pod_dir_with_generated();
    let engine = FakeEngine::default();
    let pod_file = dir.path().join("claw-pod.yml");

    assert!(down(&engine, &pod_file).await.expect("down").success());
    assert!(ps(&engine, &pod_file).await.expect("ps").success());

    assert_eq!(
        engine.calls(),
        ["compose compose.generated.yml down", "compose compose.generated.yml ps"]
    );
}

#[tokio::test]
async fn test_logs_passes_follow_and_services() {
    let dir = pod_dir_with_generated();
    let engine = FakeEngine::default();

    logs(&engine, &dir.path().join("claw-pod.yml"), true, &["bot".to_string()])
        .await
        .expect("logs");

    assert_eq!(engine.calls(), ["compose compose.generated.yml logs -f bot"]);
}

#[tokio::test]
async fn test_engine_exit_code_passes_through() {
    let dir = pod_dir_with_generated();
    let engine = FakeEngine {
        compose_code: 3,
        ..FakeEngine::default()
    };

    let status = down(&engine, &dir.path().join("claw-pod.yml")).await.expect("down");

    assert_eq!(status.code(), Some(3));
}
