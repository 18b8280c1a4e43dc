//! Tests for the `up` application service.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use clawdapus_cli::application::services::up::{
    Phase, PhaseError, UpDeps, UpOptions, generate, up,
};
use clawdapus_cli::domain::ClawdapusConfig;
use clawdapus_cli::drivers::DriverRegistry;
use clawdapus_cli::drivers::openclaw::jobs::job_id;
use clawdapus_cli::infra::fs::HostFs;
use serial_test::serial;
use tempfile::TempDir;

use crate::helpers::{FakeEngine, RecordingReporter};

const OPENCLAW: &[(&str, &str)] = &[("claw.type", "openclaw")];

/// Pod directory holding `claw-pod.yml` and an `AGENTS.md` contract.
fn pod_dir(pod_yaml: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("AGENTS.md"), "# Bot\nBe helpful.\n").expect("write contract");
    let pod_file = dir.path().join("claw-pod.yml");
    std::fs::write(&pod_file, pod_yaml).expect("write pod");
    (dir, pod_file)
}

fn opts(pod_file: &Path, detach: bool) -> UpOptions {
    UpOptions {
        pod_file: pod_file.to_path_buf(),
        detach,
        clawctl_addr: None,
    }
}

fn phase_error(err: &anyhow::Error) -> &PhaseError {
    err.downcast_ref::<PhaseError>()
        .unwrap_or_else(|| panic!("expected PhaseError, got: {err:#}"))
}

const SIMPLE_POD: &str = r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
";

#[tokio::test]
async fn test_generate_writes_compose_and_manifest() {
    let (dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let generated = generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    assert!(generated.compose_path.ends_with("compose.generated.yml"));
    assert!(generated.compose_path.is_file());
    assert!(dir.path().join(".claw-runtime/pod-manifest.json").is_file());
    assert!(dir.path().join(".claw-runtime/bot/config/openclaw.json").is_file());
    assert!(generated.resolved.contains_key("bot"));

    let events = reporter.events();
    assert!(events.contains(&"bot: validated (openclaw driver)".to_string()));
    assert!(events.contains(&"bot: materialized (openclaw driver)".to_string()));
    assert!(engine.calls().iter().all(|c| !c.starts_with("compose ")));
    assert!(reporter.warnings().is_empty());
}

#[tokio::test]
async fn test_generate_is_deterministic_across_runs() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let first = generate(&deps, &opts(&pod_file, true)).await.expect("first");
    let first_yaml = std::fs::read(&first.compose_path).expect("read");
    let second = generate(&deps, &opts(&pod_file, true)).await.expect("second");
    let second_yaml = std::fs::read(&second.compose_path).expect("read");

    assert_eq!(first_yaml, second_yaml);
}

#[tokio::test]
async fn test_generate_image_without_claw_type_fails_in_inspect() {
    let (dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", &[("maintainer", "x")]);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    let phase = phase_error(&err);
    assert_eq!(phase.service, "bot");
    assert_eq!(phase.phase, Phase::Inspect);
    assert!(phase.to_string().starts_with("[claw] bot: inspect:"));
    assert!(!dir.path().join("compose.generated.yml").exists());
}

#[tokio::test]
async fn test_generate_unknown_claw_type_fails_in_lookup() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", &[("claw.type", "hermitclaw")]);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    assert_eq!(phase_error(&err).phase, Phase::Lookup);
}

#[tokio::test]
async fn test_generate_missing_contract_fails_before_any_write() {
    let (dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    x-claw:
      agent: ./MISSING.md
",
    );
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    assert_eq!(phase_error(&err).phase, Phase::Resolve);
    assert!(!dir.path().join("compose.generated.yml").exists());
    assert!(!dir.path().join(".claw-runtime/pod-manifest.json").exists());
}

const CLLAMA_POD: &str = r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      cllama: passthrough
      count: 2
      cllama-env:
        OPENAI_API_KEY: sk-test
";

#[tokio::test]
async fn test_generate_cllama_mints_token_per_ordinal() {
    let (dir, pod_file) = pod_dir(CLLAMA_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let generated = generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    let runtime = dir.path().join(".claw-runtime");
    let tokens: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(runtime.join("cllama-tokens.json")).expect("tokens"),
    )
    .expect("parse tokens");
    let bot0 = tokens["bot-0"].as_str().expect("bot-0 token");
    assert!(bot0.starts_with("bot-0:"));
    assert!(tokens["bot-1"].as_str().expect("bot-1 token").starts_with("bot-1:"));

    let meta: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(runtime.join("context/bot-1/metadata.json")).expect("metadata"),
    )
    .expect("parse metadata");
    assert_eq!(meta["ordinal"], 1);
    assert!(runtime.join("context/bot-0/AGENTS.md").is_file());
    assert!(runtime.join("proxy-auth").is_dir());

    let compose = std::fs::read_to_string(&generated.compose_path).expect("compose");
    assert!(compose.contains("cllama-passthrough"));
    assert!(compose.contains(bot0));
    assert!(
        reporter
            .events()
            .contains(&"cllama proxies enabled: passthrough (agents: bot)".to_string())
    );

    let again = generate(&deps, &opts(&pod_file, true)).await.expect("rerun");
    let compose_again = std::fs::read_to_string(&again.compose_path).expect("compose");
    assert_eq!(compose, compose_again);
}

#[tokio::test]
async fn test_generate_cllama_rejects_provider_key_in_pod_env() {
    let (_dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    environment:
      OPENAI_API_KEY: sk-leak
    x-claw:
      agent: ./AGENTS.md
      cllama: passthrough
",
    );
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    let phase = phase_error(&err);
    assert_eq!(phase.phase, Phase::Validate);
    assert!(phase.to_string().contains("credential starvation"));
    assert!(phase.to_string().contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_generate_cllama_rejects_provider_key_baked_into_image() {
    let (_dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      cllama: passthrough
",
    );
    let mut engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    engine.env.insert(
        "bot:latest".into(),
        [("ANTHROPIC_API_KEY".to_string(), "sk-ant".to_string())].into(),
    );
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    assert!(phase_error(&err).to_string().contains("image-baked env"));
}

#[tokio::test]
async fn test_generate_mixed_proxy_types_are_rejected() {
    let (_dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: demo
services:
  alpha:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      cllama: passthrough
  beta:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      cllama: policy
",
    );
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    assert!(format!("{err:#}").contains("multi-proxy chaining"));
}

const SURFACE_POD: &str = r"
x-claw:
  pod: demo
services:
  api:
    image: api:latest
    expose:
      - '8080'
  bot:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      surfaces:
        - service://api
";

#[tokio::test]
async fn test_generate_uses_skill_emitted_by_surface_target() {
    let (dir, pod_file) = pod_dir(SURFACE_POD);
    let mut engine = FakeEngine::default()
        .with_image("bot:latest", OPENCLAW)
        .with_image("api:latest", &[("claw.skill.emit", "/app/SKILL.md")]);
    engine.files.insert(
        ("api:latest".into(), "/app/SKILL.md".into()),
        b"# api\nPOST /orders\n".to_vec(),
    );
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    let skill = std::fs::read_to_string(dir.path().join(".claw-runtime/bot/skills/surface-api.md"))
        .expect("skill");
    assert_eq!(skill, "# api\nPOST /orders\n");
    assert!(reporter.warnings().is_empty());
}

#[tokio::test]
async fn test_generate_failed_skill_extraction_warns_and_falls_back() {
    let (dir, pod_file) = pod_dir(SURFACE_POD);
    let engine = FakeEngine::default()
        .with_image("bot:latest", OPENCLAW)
        .with_image("api:latest", &[("claw.skill.emit", "/app/SKILL.md")]);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    let skill = std::fs::read_to_string(dir.path().join(".claw-runtime/bot/skills/surface-api.md"))
        .expect("skill");
    assert!(skill.contains("api"));
    assert_ne!(skill, "# api\nPOST /orders\n");
    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("using fallback"));
}

#[tokio::test]
async fn test_generate_unknown_invoke_channel_warns() {
    let (_dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    x-claw:
      agent: ./AGENTS.md
      invoke:
        - schedule: '0 9 * * *'
          message: Post the standup
          to: nowhere
",
    );
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let generated = generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    assert!(generated.resolved["bot"].invocations[0].to.is_empty());
    let warnings = reporter.warnings();
    assert!(warnings.iter().any(|w| w.contains("\"nowhere\" not found")));
}

#[tokio::test]
async fn test_up_without_detach_is_refused() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let err = up(&deps, &opts(&pod_file, false)).await.expect_err("attached up");

    assert!(err.to_string().contains("detached mode"));
    assert!(engine.calls().iter().all(|c| !c.starts_with("compose ")));
}

#[tokio::test]
async fn test_up_detached_verifies_each_container() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default()
        .with_image("bot:latest", OPENCLAW)
        .with_container("bot", "0123456789abcdef", OPENCLAW, true);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    up(&deps, &opts(&pod_file, true)).await.expect("up");

    assert!(engine.calls().contains(&"compose compose.generated.yml up -d".to_string()));
    let events = reporter.events();
    assert!(events.contains(&"bot (0123456789ab): post-apply verified".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("pod is up"));
}

#[tokio::test]
async fn test_up_missing_container_fails_post_apply() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let err = up(&deps, &opts(&pod_file, true)).await.expect_err("no container");

    let phase = phase_error(&err);
    assert_eq!(phase.phase, Phase::PostApply);
    assert_eq!(phase.service, "bot");
    assert!(!reporter.events().contains(&"pod is up".to_string()));
}

#[tokio::test]
async fn test_up_stopped_container_fails_post_apply() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default()
        .with_image("bot:latest", OPENCLAW)
        .with_container("bot", "0123456789abcdef", OPENCLAW, false);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let err = up(&deps, &opts(&pod_file, true)).await.expect_err("stopped");

    let phase = phase_error(&err);
    assert_eq!(phase.phase, Phase::PostApply);
    assert!(phase.to_string().contains("not running"));
}

#[tokio::test]
async fn test_up_compose_failure_is_reported() {
    let (_dir, pod_file) = pod_dir(SIMPLE_POD);
    let mut engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    engine.compose_code = 1;
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let err = up(&deps, &opts(&pod_file, true)).await.expect_err("compose failed");

    assert!(err.to_string().starts_with("compose up failed"));
}

const DISCORD_POD: &str = r"
x-claw:
  pod: demo
services:
  bot:
    image: bot:latest
    environment:
      DISCORD_BOT_TOKEN: '${DISCORD_BOT_TOKEN}'
    x-claw:
      agent: ./AGENTS.md
      handles:
        discord:
          id: '123456789'
          username: desk-bot
";

/// Set or clear a process env var. Only call from `#[serial]` tests.
#[allow(unsafe_code)]
fn set_process_env(key: &str, value: Option<&str>) {
    // SAFETY: serialized with other env-mutating tests.
    unsafe {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}

#[tokio::test]
#[serial]
async fn test_generate_discord_handle_projects_handle_skill() {
    set_process_env("DISCORD_BOT_TOKEN", Some("discord-test-token"));
    let (dir, pod_file) = pod_dir(DISCORD_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let result = generate(&deps, &opts(&pod_file, true)).await;
    set_process_env("DISCORD_BOT_TOKEN", None);
    let generated = result.expect("generate");

    let skill = std::fs::read_to_string(dir.path().join(".claw-runtime/bot/skills/handle-discord.md"))
        .expect("handle skill");
    assert!(skill.contains("123456789"));
    let compose = std::fs::read_to_string(&generated.compose_path).expect("compose");
    assert!(compose.contains("/claw/skills/handle-discord.md:ro"));
    assert!(!compose.contains("discord-test-token"));
}

#[tokio::test]
#[serial]
async fn test_generate_discord_handle_without_token_fails_validate() {
    set_process_env("DISCORD_BOT_TOKEN", None);
    let (dir, pod_file) = pod_dir(DISCORD_POD);
    let engine = FakeEngine::default().with_image("bot:latest", OPENCLAW);
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let Err(err) = generate(&deps, &opts(&pod_file, true)).await else {
        panic!("expected failure");
    };
    let phase = phase_error(&err);
    assert_eq!(phase.phase, Phase::Validate);
    assert!(phase.to_string().starts_with("[claw] bot: validate:"));
    assert!(phase.to_string().contains("DISCORD_BOT_TOKEN"));
    assert!(!dir.path().join("compose.generated.yml").exists());
}

#[tokio::test]
async fn test_generate_invoke_writes_stable_cron_jobs() {
    let (dir, pod_file) = pod_dir(SIMPLE_POD);
    let engine = FakeEngine::default().with_image(
        "bot:latest",
        &[
            ("claw.type", "openclaw"),
            ("claw.invoke.0", "15 8 * * 1-5\tPre-market synthesis"),
        ],
    );
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };
    let jobs_path = dir.path().join(".claw-runtime/bot/state/cron/jobs.json");

    generate(&deps, &opts(&pod_file, true)).await.expect("first");
    let first = std::fs::read(&jobs_path).expect("jobs");
    generate(&deps, &opts(&pod_file, true)).await.expect("second");
    let second = std::fs::read(&jobs_path).expect("jobs");

    assert_eq!(first, second);
    let jobs: serde_json::Value = serde_json::from_slice(&second).expect("parse jobs");
    let jobs = jobs.as_array().expect("job list");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], job_id("bot", "15 8 * * 1-5", "Pre-market synthesis"));
    assert_eq!(jobs[0]["schedule"]["expr"], "15 8 * * 1-5");
    assert_eq!(jobs[0]["payload"]["message"], "Pre-market synthesis");
}

#[tokio::test]
async fn test_generate_mixed_pod_materializes_microclaw() {
    let (dir, pod_file) = pod_dir(
        r"
x-claw:
  pod: desk
services:
  oc:
    image: oc:latest
    x-claw:
      agent: ./AGENTS.md
  micro:
    image: micro:latest
    environment:
      ANTHROPIC_API_KEY: sk-ant-test
    x-claw:
      agent: ./AGENTS.md
",
    );
    let engine = FakeEngine::default().with_image("oc:latest", OPENCLAW).with_image(
        "micro:latest",
        &[("claw.type", "microclaw"), ("claw.model.primary", "anthropic/claude-sonnet-4")],
    );
    let registry = DriverRegistry::with_builtin();
    let config = ClawdapusConfig::default();
    let reporter = RecordingReporter::default();
    let deps = UpDeps {
        engine: &engine,
        registry: &registry,
        config: &config,
        reporter: &reporter,
        fs: &HostFs,
    };

    let generated = generate(&deps, &opts(&pod_file, true)).await.expect("generate");

    let runtime = dir.path().join(".claw-runtime");
    let yaml = std::fs::read_to_string(runtime.join("micro/config/microclaw.config.yaml"))
        .expect("microclaw config");
    assert!(yaml.contains("llm_provider: anthropic\n"));
    assert!(yaml.contains("model: claude-sonnet-4\n"));
    assert!(runtime.join("micro/data/runtime/groups/AGENTS.md").is_file());
    assert!(runtime.join("oc/config/openclaw.json").is_file());
    let compose = std::fs::read_to_string(&generated.compose_path).expect("compose");
    assert!(compose.contains("MICROCLAW_CONFIG: /app/config/microclaw.config.yaml"));
    assert!(
        reporter
            .events()
            .contains(&"micro: validated (microclaw driver)".to_string())
    );
}
