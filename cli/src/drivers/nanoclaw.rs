//! nanoclaw: an orchestrator that spawns its own agent containers, so it
//! needs the engine socket and cannot run on a read-only root.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::ContainerEngine;
use crate::domain::error::{MaterializationError, ValidationError};
use crate::domain::health::Health;
use crate::domain::markdown::clawdapus_md;
use crate::domain::pod::CLAW_NETWORK;
use crate::domain::resolved::{
    ContainerRef, Healthcheck, MaterializeOpts, MaterializeResult, Mount, PostApplyOpts,
    ResolvedClaw, SkillLayout,
};
use crate::drivers::Driver;
use crate::drivers::shared::{
    CLAW_MANAGED, ensure_running, pod_name, proxy_base_url, require_contract,
    require_handle_tokens, running_health, write_runtime_file,
};

pub(crate) const DRIVER: &str = "nanoclaw";

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

pub struct NanoClawDriver;

#[async_trait(?Send)]
impl Driver for NanoClawDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn validate(&self, rc: &ResolvedClaw) -> Result<(), ValidationError> {
        require_contract(DRIVER, rc)?;
        if rc.privileges.get("docker-socket").map(String::as_str) != Some("true") {
            return Err(ValidationError::Requirement {
                driver: DRIVER,
                reason: "requires PRIVILEGE docker-socket (nanoclaw spawns agent containers via the engine)"
                    .to_string(),
            });
        }
        if let Some(command) = rc.configures.first() {
            return Err(ValidationError::Requirement {
                driver: DRIVER,
                reason: format!("CONFIGURE is not supported (got {command:?})"),
            });
        }
        require_handle_tokens(DRIVER, rc)?;
        if !rc.invocations.is_empty() {
            tracing::warn!(
                service = %rc.service_name,
                count = rc.invocations.len(),
                "nanoclaw does not support INVOKE scheduling; ignoring invocations"
            );
        }
        Ok(())
    }

    fn materialize(
        &self,
        rc: &ResolvedClaw,
        opts: &MaterializeOpts,
    ) -> Result<MaterializeResult, MaterializationError> {
        let pod = pod_name(rc, opts);
        let contract = std::fs::read_to_string(&rc.agent_host_path).map_err(|source| {
            MaterializationError::Io {
                driver: DRIVER,
                path: rc.agent_host_path.display().to_string(),
                source,
            }
        })?;
        // The SDK only auto-loads CLAUDE.md, so contract and pod context share one file.
        let combined = format!("{contract}\n\n---\n\n{}", clawdapus_md(rc, pod));
        let claude_path = opts.runtime_dir.join("CLAUDE.md");
        write_runtime_file(DRIVER, &claude_path, combined, 0o644)?;

        let mut mounts = vec![
            Mount::read_only(claude_path, "/workspace/groups/main/CLAUDE.md"),
            Mount {
                host_path: PathBuf::from(DOCKER_SOCKET),
                container_path: DOCKER_SOCKET.to_string(),
                read_only: false,
            },
        ];
        let mut environment =
            BTreeMap::from([(CLAW_MANAGED.0.to_string(), CLAW_MANAGED.1.to_string())]);

        if let Some(proxy) = rc.cllama_proxy() {
            environment.insert("ANTHROPIC_BASE_URL".to_string(), proxy_base_url(proxy));
            // Spawned agents join the compose network `<project>_<network>`.
            environment.insert("CLAW_NETWORK".to_string(), format!("{pod}_{CLAW_NETWORK}"));
            if !rc.cllama_token.is_empty() {
                let env_path = opts.runtime_dir.join(".env");
                write_runtime_file(
                    DRIVER,
                    &env_path,
                    format!("ANTHROPIC_API_KEY={}\n", rc.cllama_token),
                    0o600,
                )?;
                mounts.push(Mount::read_only(env_path, "/workspace/.env"));
            }
        }

        Ok(MaterializeResult {
            mounts,
            tmpfs: vec!["/tmp".to_string()],
            environment,
            healthcheck: Some(Healthcheck {
                test: vec![
                    "CMD-SHELL".to_string(),
                    "pgrep -f 'node.*index' > /dev/null".to_string(),
                ],
                interval: "30s".to_string(),
                timeout: "10s".to_string(),
                retries: 3,
            }),
            read_only: false,
            restart: "on-failure".to_string(),
            skill_dir: "/workspace/container/skills".to_string(),
            skill_layout: SkillLayout::Directory,
        })
    }

    async fn post_apply(
        &self,
        _rc: &ResolvedClaw,
        opts: &PostApplyOpts,
        engine: &dyn ContainerEngine,
    ) -> Result<()> {
        ensure_running(DRIVER, &opts.container_id, engine).await
    }

    async fn health_probe(
        &self,
        target: &ContainerRef,
        engine: &dyn ContainerEngine,
    ) -> Result<Health> {
        running_health(target, engine).await
    }
}
