//! nullclaw: a single-binary runtime with a snake_case `config.json` and a
//! cron table managed through its own CLI.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::ContainerEngine;
use crate::domain::error::{MaterializationError, ValidationError};
use crate::domain::health::Health;
use crate::domain::resolved::{
    ContainerRef, Healthcheck, MaterializeOpts, MaterializeResult, Mount, PostApplyOpts,
    ResolvedClaw, SkillLayout,
};
use crate::drivers::Driver;
use crate::drivers::shared::{
    CLAW_MANAGED, CLAWDAPUS_MD_PATH, ensure_running, render_config, require_configure_prefix,
    require_contract, require_handle_tokens, running_health, write_clawdapus_md,
    write_runtime_file,
};
use crate::runtime::files::ensure_dir;

pub mod config;
pub mod cron;

pub(crate) const DRIVER: &str = "nullclaw";

pub struct NullClawDriver;

#[async_trait(?Send)]
impl Driver for NullClawDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn validate(&self, rc: &ResolvedClaw) -> Result<(), ValidationError> {
        require_contract(DRIVER, rc)?;
        require_configure_prefix(DRIVER, DRIVER, "nullclaw config set", rc)?;
        require_handle_tokens(DRIVER, rc)
    }

    fn materialize(
        &self,
        rc: &ResolvedClaw,
        opts: &MaterializeOpts,
    ) -> Result<MaterializeResult, MaterializationError> {
        let doc = config::generate_config(rc)?;
        let home = opts.runtime_dir.join("nullclaw-home");
        ensure_dir(&home, 0o700).map_err(|source| MaterializationError::Io {
            driver: DRIVER,
            path: home.display().to_string(),
            source,
        })?;
        write_runtime_file(DRIVER, &home.join("config.json"), render_config(DRIVER, &doc)?, 0o644)?;
        let clawdapus_path = write_clawdapus_md(DRIVER, rc, opts)?;

        let home_mount = |container_path: &str| Mount {
            host_path: home.clone(),
            container_path: container_path.to_string(),
            read_only: false,
        };
        Ok(MaterializeResult {
            // The upstream image sets HOME=/nullclaw-data; both locations see the same dir.
            mounts: vec![
                home_mount("/root/.nullclaw"),
                home_mount("/nullclaw-data/.nullclaw"),
                Mount::read_only(rc.agent_host_path.clone(), "/claw/AGENTS.md"),
                Mount::read_only(clawdapus_path, CLAWDAPUS_MD_PATH),
            ],
            tmpfs: vec!["/tmp".to_string()],
            environment: BTreeMap::from([(CLAW_MANAGED.0.to_string(), CLAW_MANAGED.1.to_string())]),
            healthcheck: Some(Healthcheck {
                test: vec![
                    "CMD-SHELL".to_string(),
                    "curl -fsS http://localhost:3000/health >/dev/null || exit 1".to_string(),
                ],
                interval: "30s".to_string(),
                timeout: "10s".to_string(),
                retries: 3,
            }),
            read_only: true,
            restart: "on-failure".to_string(),
            skill_dir: "/claw/skills".to_string(),
            skill_layout: SkillLayout::Flat,
        })
    }

    async fn post_apply(
        &self,
        rc: &ResolvedClaw,
        opts: &PostApplyOpts,
        engine: &dyn ContainerEngine,
    ) -> Result<()> {
        ensure_running(DRIVER, &opts.container_id, engine).await?;
        if rc.invocations.is_empty() {
            return Ok(());
        }
        let outcomes = cron::register(engine, &opts.container_id, &rc.invocations)
            .await
            .with_context(|| format!("{DRIVER} driver: post-apply cron registration failed"))?;
        for outcome in outcomes {
            match outcome {
                cron::CronOutcome::Exists(schedule) => {
                    tracing::info!(service = %rc.service_name, %schedule, "nullclaw cron job already exists");
                }
                cron::CronOutcome::Registered(schedule) => {
                    tracing::info!(service = %rc.service_name, %schedule, "registered nullclaw cron job");
                }
            }
        }
        Ok(())
    }

    async fn health_probe(
        &self,
        target: &ContainerRef,
        engine: &dyn ContainerEngine,
    ) -> Result<Health> {
        running_health(target, engine).await
    }
}
