//! microclaw: a lightweight runtime configured from one YAML file, with its
//! state and skills under a single writable data directory.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::ContainerEngine;
use crate::domain::error::{MaterializationError, ValidationError};
use crate::domain::health::Health;
use crate::domain::markdown::clawdapus_md;
use crate::domain::resolved::{
    ContainerRef, Healthcheck, MaterializeOpts, MaterializeResult, Mount, PostApplyOpts,
    ResolvedClaw, SkillLayout,
};
use crate::drivers::Driver;
use crate::drivers::shared::{
    CLAW_MANAGED, ensure_running, env_token, pod_name, require_contract, running_health,
    write_runtime_file,
};
use crate::runtime::files::ensure_dir;

pub mod config;

pub(crate) const DRIVER: &str = "microclaw";

pub struct MicroClawDriver;

#[async_trait(?Send)]
impl Driver for MicroClawDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn validate(&self, rc: &ResolvedClaw) -> Result<(), ValidationError> {
        require_contract(DRIVER, rc)?;
        let requirement = |reason: String| ValidationError::Requirement { driver: DRIVER, reason };
        let (provider, _) = config::primary_model(&rc.models).map_err(requirement)?;

        if let Some(command) = rc.configures.iter().find(|c| config::parse_configure(c).is_none()) {
            return Err(ValidationError::UnsupportedConfigure {
                driver: DRIVER,
                command: command.clone(),
                prefix: "microclaw config set",
            });
        }

        let env = &rc.environment;
        for platform in rc.handles.keys() {
            let required: &[&'static str] = match platform.as_str() {
                "discord" => &["DISCORD_BOT_TOKEN"],
                "telegram" => &["TELEGRAM_BOT_TOKEN"],
                "slack" => &["SLACK_BOT_TOKEN", "SLACK_APP_TOKEN"],
                other => {
                    tracing::warn!(driver = DRIVER, platform = other, "no HANDLE mapping for platform; skipping channel enablement");
                    continue;
                }
            };
            if let Some(var) = required.iter().copied().find(|var| env_token(env, var).is_empty()) {
                return Err(ValidationError::MissingTokenEnv {
                    driver: DRIVER,
                    platform: platform.clone(),
                    var,
                });
            }
        }

        if rc.cllama.is_empty()
            && config::provider_needs_key(&provider)
            && config::provider_api_key(&provider, env).is_empty()
        {
            return Err(requirement(format!(
                "no API key found for provider {provider:?} (checked: {})",
                config::expected_provider_keys(&provider).join(", ")
            )));
        }

        if !rc.invocations.is_empty() {
            tracing::warn!(
                driver = DRIVER,
                service = %rc.service_name,
                count = rc.invocations.len(),
                "INVOKE scheduling not supported; ignoring invocations"
            );
        }
        Ok(())
    }

    fn materialize(
        &self,
        rc: &ResolvedClaw,
        opts: &MaterializeOpts,
    ) -> Result<MaterializeResult, MaterializationError> {
        let yaml = config::render_yaml(config::generate_config(rc)?)?;
        let config_dir = opts.runtime_dir.join("config");
        let data_dir = opts.runtime_dir.join("data");
        let groups_dir = data_dir.join("runtime").join("groups");
        for dir in [
            &config_dir,
            &groups_dir,
            &data_dir.join("skills"),
            &data_dir.join("working_dir"),
        ] {
            ensure_dir(dir, 0o700).map_err(|source| MaterializationError::Io {
                driver: DRIVER,
                path: dir.display().to_string(),
                source,
            })?;
        }
        let config_path = config_dir.join("microclaw.config.yaml");
        write_runtime_file(DRIVER, &config_path, yaml, 0o644)?;

        // microclaw reads its instructions from the group memory file, so the
        // contract and the pod context are seeded there as one document.
        let contract = std::fs::read_to_string(&rc.agent_host_path).map_err(|source| {
            MaterializationError::Read {
                driver: DRIVER,
                path: rc.agent_host_path.display().to_string(),
                source,
            }
        })?;
        let seeded = format!(
            "{}\n\n---\n\n{}\n",
            contract.trim(),
            clawdapus_md(rc, pod_name(rc, opts)).trim()
        );
        write_runtime_file(DRIVER, &groups_dir.join("AGENTS.md"), seeded, 0o644)?;

        Ok(MaterializeResult {
            mounts: vec![
                Mount::read_only(config_path, config::CONFIG_CONTAINER_PATH),
                Mount {
                    host_path: data_dir,
                    container_path: config::DATA_DIR.to_string(),
                    read_only: false,
                },
            ],
            tmpfs: vec!["/tmp".to_string()],
            environment: BTreeMap::from([
                (CLAW_MANAGED.0.to_string(), CLAW_MANAGED.1.to_string()),
                ("MICROCLAW_CONFIG".to_string(), config::CONFIG_CONTAINER_PATH.to_string()),
            ]),
            healthcheck: Some(Healthcheck {
                test: vec![
                    "CMD-SHELL".to_string(),
                    "pgrep -f 'microclaw' > /dev/null".to_string(),
                ],
                interval: "30s".to_string(),
                timeout: "10s".to_string(),
                retries: 3,
            }),
            read_only: false,
            restart: "on-failure".to_string(),
            skill_dir: format!("{}/skills", config::DATA_DIR),
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
