//! Tests for the `agent add` application service.

#![allow(clippy::expect_used)]

use std::path::Path;

use clawdapus_cli::application::services::agent_add::add_agent;
use clawdapus_cli::domain::scaffold::AgentRequest;

use crate::helpers::{MemFs, RecordingReporter};

const POD_FILE: &str = "/pod/claw-pod.yml";

const POD: &str = "x-claw:
  pod: desk
services:
  trader:
    image: desk-trader:latest
    x-claw:
      agent: ./agents/trader/AGENTS.md
      cllama: passthrough
";

fn request(name: &str) -> AgentRequest {
    AgentRequest {
        name: name.into(),
        ..AgentRequest::default()
    }
}

#[test]
fn test_add_agent_dry_run_writes_nothing() {
    let fs = MemFs::default().with_file(POD_FILE, POD);
    let reporter = RecordingReporter::default();

    let outcome = add_agent(&fs, &reporter, Path::new(POD_FILE), &request("analyst"), true)
        .expect("dry run");

    assert!(!outcome.written);
    assert_eq!(outcome.plan.cllama, "passthrough");
    assert!(outcome.planned.contains(&"+ create agents/analyst/Clawfile".to_string()));
    assert_eq!(fs.read(POD_FILE).as_deref(), Some(POD));
    assert_eq!(fs.files.borrow().len(), 1);
    assert!(fs.dirs.borrow().is_empty());
    assert!(reporter.events().contains(&"planned changes:".to_string()));
}

#[test]
fn test_add_agent_writes_clawfile_contract_and_service() {
    let fs = MemFs::default().with_file(POD_FILE, POD);
    let reporter = RecordingReporter::default();

    let outcome = add_agent(&fs, &reporter, Path::new(POD_FILE), &request("analyst"), false)
        .expect("add");

    assert!(outcome.written);
    let clawfile = fs.read("/pod/agents/analyst/Clawfile").expect("Clawfile");
    assert!(clawfile.starts_with("FROM openclaw:latest"));
    assert!(clawfile.contains("CLLAMA passthrough"));
    assert!(fs.read("/pod/agents/analyst/AGENTS.md").is_some());

    let pod = fs.read(POD_FILE).expect("pod");
    assert!(pod.contains("  analyst:\n"));
    assert!(pod.contains("image: desk-analyst:latest"));
    assert!(pod.contains("trader:"));

    let env = fs.read("/pod/.env.example").expect(".env.example");
    assert!(env.contains("ANALYST_DISCORD_BOT_TOKEN"));
    assert!(
        reporter
            .lines
            .borrow()
            .contains(&"success: updated claw-pod.yml".to_string())
    );
}

#[test]
fn test_add_agent_existing_service_is_refused() {
    let fs = MemFs::default().with_file(POD_FILE, POD);
    let reporter = RecordingReporter::default();

    let err = add_agent(&fs, &reporter, Path::new(POD_FILE), &request("trader"), false)
        .expect_err("duplicate");

    assert!(err.to_string().contains("already exists"));
    assert_eq!(fs.read(POD_FILE).as_deref(), Some(POD));
}

#[test]
fn test_add_agent_existing_clawfile_is_refused() {
    let fs = MemFs::default()
        .with_file(POD_FILE, POD)
        .with_file("/pod/agents/analyst/Clawfile", "FROM custom\n");
    let reporter = RecordingReporter::default();

    let err = add_agent(&fs, &reporter, Path::new(POD_FILE), &request("analyst"), false)
        .expect_err("existing file");

    assert_eq!(
        err.to_string(),
        "agents/analyst/Clawfile already exists; refusing to overwrite"
    );
    assert_eq!(fs.read("/pod/agents/analyst/Clawfile").as_deref(), Some("FROM custom\n"));
}

#[test]
fn test_add_agent_shared_contract_copies_and_rewires() {
    let fs = MemFs::default()
        .with_file(POD_FILE, POD)
        .with_file("/pod/agents/trader/AGENTS.md", "# Trader\n");
    let reporter = RecordingReporter::default();
    let req = AgentRequest {
        rewire_from: Some("./agents/trader/AGENTS.md".into()),
        shared: Some("./shared/AGENTS.md".into()),
        ..request("analyst")
    };

    let outcome = add_agent(&fs, &reporter, Path::new(POD_FILE), &req, false).expect("add");

    assert!(!outcome.plan.create_agent_file);
    assert_eq!(fs.read("/pod/shared/AGENTS.md").as_deref(), Some("# Trader\n"));
    assert!(fs.read("/pod/agents/analyst/AGENTS.md").is_none());
    let pod = fs.read(POD_FILE).expect("pod");
    assert!(!pod.contains("./agents/trader/AGENTS.md"));
    assert_eq!(pod.matches("./shared/AGENTS.md").count(), 2);
}

#[test]
fn test_add_agent_shared_target_outside_pod_is_refused() {
    let fs = MemFs::default().with_file(POD_FILE, POD);
    let reporter = RecordingReporter::default();
    let req = AgentRequest {
        rewire_from: Some("./agents/trader/AGENTS.md".into()),
        shared: Some("../elsewhere/AGENTS.md".into()),
        ..request("analyst")
    };

    let err = add_agent(&fs, &reporter, Path::new(POD_FILE), &req, false).expect_err("escape");

    assert!(err.to_string().contains("inside the pod directory"));
}
