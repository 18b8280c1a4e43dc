//! Infrastructure implementation of the `ContainerEngine` port.
//!
//! `DockerEngine<R>` routes every engine call through a `CommandRunner`
//! invoking the docker CLI (or a compatible binary from the config).

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ContainerDetails, ContainerEngine, ExecOutput};
use crate::domain::config::DEFAULT_ENGINE_BINARY;
use crate::domain::error::EngineError;
use crate::domain::health::ContainerState;
use crate::infra::command_runner::TokioCommandRunner;

/// Generic over `R: CommandRunner` so tests can inject a scripted runner.
pub struct DockerEngine<R: CommandRunner> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> DockerEngine<R> {
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        let binary = binary.into();
        Self {
            runner,
            binary: if binary.trim().is_empty() {
                DEFAULT_ENGINE_BINARY.to_string()
            } else {
                binary
            },
        }
    }

    /// Run a captured command and fail on a non-zero exit.
    async fn query(&self, args: &[&str]) -> Result<Output> {
        let output = self
            .runner
            .run(&self.binary, args)
            .await
            .with_context(|| format!("{} {}", self.binary, args.first().unwrap_or(&"")))?;
        check(&self.binary, args, output)
    }
}

impl DockerEngine<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn with_binary(binary: &str) -> Self {
        Self::new(TokioCommandRunner::default(), binary)
    }
}

fn check(binary: &str, args: &[&str], output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    Err(EngineError::Failed {
        command: format!("{binary} {}", args.iter().take(2).copied().collect::<Vec<_>>().join(" ")),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

fn decode_error(command: &str, reason: impl std::fmt::Display) -> EngineError {
    EngineError::Decode {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

// ── inspect payloads ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedContainer {
    #[serde(default)]
    config: InspectedConfig,
    #[serde(default)]
    state: InspectedState,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct InspectedConfig {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct InspectedState {
    #[serde(default)]
    running: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    health: Option<InspectedHealth>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedHealth {
    #[serde(default)]
    status: String,
}

/// `KEY=VALUE` lines split on the first `=`. Entries without one map to "".
#[must_use]
pub fn parse_env_list(entries: &[String]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|e| match e.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (e.clone(), String::new()),
        })
        .collect()
}

#[async_trait(?Send)]
impl<R: CommandRunner> ContainerEngine for DockerEngine<R> {
    async fn image_labels(&self, image: &str) -> Result<BTreeMap<String, String>> {
        let out = self
            .query(&["image", "inspect", "--format", "{{json .Config.Labels}}", image])
            .await?;
        let labels: Option<BTreeMap<String, String>> = serde_json::from_slice(&out.stdout)
            .map_err(|e| decode_error("image inspect", e))?;
        Ok(labels.unwrap_or_default())
    }

    async fn image_env(&self, image: &str) -> Result<BTreeMap<String, String>> {
        let out = self
            .query(&["image", "inspect", "--format", "{{json .Config.Env}}", image])
            .await?;
        let env: Option<Vec<String>> = serde_json::from_slice(&out.stdout)
            .map_err(|e| decode_error("image inspect", e))?;
        Ok(parse_env_list(&env.unwrap_or_default()))
    }

    async fn copy_from_image(&self, image: &str, path: &str) -> Result<Vec<u8>> {
        let created = self
            .query(&["create", image])
            .await
            .with_context(|| format!("create temp container from {image:?}"))?;
        let id = String::from_utf8_lossy(&created.stdout).trim().to_string();
        if id.is_empty() {
            return Err(decode_error("create", "empty container id").into());
        }

        let copied = async {
            let dir = tempfile::tempdir().context("create temp dir")?;
            let dest = dir.path().join("extracted");
            let source = format!("{id}:{path}");
            let dest_arg = dest.to_string_lossy().into_owned();
            self.query(&["cp", &source, &dest_arg])
                .await
                .with_context(|| format!("copy {path:?} from {image:?}"))?;
            if !dest.is_file() {
                anyhow::bail!("{path:?} in {image:?} is not a regular file");
            }
            std::fs::read(&dest).with_context(|| format!("read {path:?} extracted from {image:?}"))
        }
        .await;

        if let Err(e) = self.query(&["rm", "-f", &id]).await {
            tracing::debug!(container = %id, error = %format!("{e:#}"), "temp container cleanup failed");
        }
        copied
    }

    async fn build(&self, dockerfile: &Path, context: &Path, tag: Option<&str>) -> Result<ExitStatus> {
        let dockerfile = dockerfile.to_string_lossy();
        let context = context.to_string_lossy();
        let mut args = vec!["build", "-f", &*dockerfile];
        if let Some(tag) = tag {
            args.extend(["-t", tag]);
        }
        args.push(&*context);
        self.runner.run_status(&self.binary, &args).await
    }

    async fn compose(&self, compose_file: &Path, args: &[&str]) -> Result<ExitStatus> {
        let file = compose_file.to_string_lossy();
        let mut full = vec!["compose", "-f", &*file];
        full.extend_from_slice(args);
        self.runner.run_status(&self.binary, &full).await
    }

    async fn compose_ps_ids(&self, compose_file: &Path, service: Option<&str>) -> Result<Vec<String>> {
        let file = compose_file.to_string_lossy();
        let mut args = vec!["compose", "-f", &*file, "ps", "-q"];
        args.extend(service);
        let out = self.query(&args).await?;
        Ok(String::from_utf8_lossy(&out.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn container_details(&self, container_id: &str) -> Result<ContainerDetails> {
        let out = self.query(&["inspect", "--type", "container", container_id]).await?;
        let mut inspected: Vec<InspectedContainer> =
            serde_json::from_slice(&out.stdout).map_err(|e| decode_error("inspect", e))?;
        if inspected.is_empty() {
            return Err(decode_error("inspect", format!("no container {container_id:?}")).into());
        }
        let c = inspected.swap_remove(0);
        Ok(ContainerDetails {
            labels: c.config.labels.unwrap_or_default(),
            state: ContainerState {
                running: c.state.running,
                status: c.state.status,
                health: c.state.health.map(|h| h.status).unwrap_or_default(),
            },
        })
    }

    async fn exec(&self, container_id: &str, cmd: &[&str], timeout: Duration) -> Result<ExecOutput> {
        let mut args = vec!["exec", container_id];
        args.extend_from_slice(cmd);
        let out = self.runner.run_with_timeout(&self.binary, &args, timeout).await?;
        Ok(ExecOutput {
            exit_code: out.status.code().unwrap_or(-1),
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }
}
