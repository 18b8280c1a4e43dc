//! openclaw: a gateway runtime configured by a single JSON document, with
//! scheduled jobs read from its state directory.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::ContainerEngine;
use crate::domain::error::{MaterializationError, ValidationError};
use crate::domain::health::{Health, parse_health_json};
use crate::domain::resolved::{
    ContainerRef, Healthcheck, MaterializeOpts, MaterializeResult, Mount, PostApplyOpts,
    ResolvedClaw, SkillLayout,
};
use crate::drivers::Driver;
use crate::drivers::shared::{
    CLAW_MANAGED, CLAWDAPUS_MD_PATH, ensure_running, render_config, require_configure_prefix,
    require_contract, require_handle_tokens, write_clawdapus_md, write_runtime_file,
};
use crate::runtime::files::ensure_dir;

pub mod config;
pub mod jobs;

pub(crate) const DRIVER: &str = "openclaw";

const CONFIG_CONTAINER_PATH: &str = "/app/config/openclaw.json";
const STATE_CONTAINER_PATH: &str = "/app/state";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(15);

pub struct OpenClawDriver;

#[async_trait(?Send)]
impl Driver for OpenClawDriver {
    fn name(&self) -> &'static str {
        DRIVER
    }

    fn validate(&self, rc: &ResolvedClaw) -> Result<(), ValidationError> {
        require_contract(DRIVER, rc)?;
        require_handle_tokens(DRIVER, rc)?;
        require_configure_prefix(DRIVER, DRIVER, "openclaw config set", rc)
    }

    fn materialize(
        &self,
        rc: &ResolvedClaw,
        opts: &MaterializeOpts,
    ) -> Result<MaterializeResult, MaterializationError> {
        let doc = config::generate_config(rc)?;
        let config_path = opts.runtime_dir.join("config").join("openclaw.json");
        write_runtime_file(DRIVER, &config_path, render_config(DRIVER, &doc)?, 0o644)?;

        let state_dir = opts.runtime_dir.join("state");
        ensure_dir(&state_dir, 0o700).map_err(|source| MaterializationError::Io {
            driver: DRIVER,
            path: state_dir.display().to_string(),
            source,
        })?;
        let jobs_path = state_dir.join("cron").join("jobs.json");
        let existing = std::fs::read_to_string(&jobs_path)
            .map(|s| jobs::parse_jobs(&s))
            .unwrap_or_default();
        let jobs = jobs::build_jobs(&rc.service_name, &rc.invocations, &existing);
        let mut jobs_json =
            serde_json::to_string_pretty(&jobs).map_err(|source| MaterializationError::Encode {
                driver: DRIVER,
                what: "jobs",
                source,
            })?;
        jobs_json.push('\n');
        write_runtime_file(DRIVER, &jobs_path, jobs_json, 0o644)?;

        let clawdapus_path = write_clawdapus_md(DRIVER, rc, opts)?;

        Ok(MaterializeResult {
            mounts: vec![
                Mount::read_only(config_path, CONFIG_CONTAINER_PATH),
                Mount::read_only(rc.agent_host_path.clone(), format!("/claw/{}", rc.agent)),
                Mount::read_only(clawdapus_path, CLAWDAPUS_MD_PATH),
                Mount {
                    host_path: state_dir,
                    container_path: STATE_CONTAINER_PATH.to_string(),
                    read_only: false,
                },
            ],
            tmpfs: ["/tmp", "/run", "/app/data", "/root/.openclaw"]
                .map(String::from)
                .to_vec(),
            environment: BTreeMap::from([
                (CLAW_MANAGED.0.to_string(), CLAW_MANAGED.1.to_string()),
                ("OPENCLAW_CONFIG_PATH".to_string(), CONFIG_CONTAINER_PATH.to_string()),
                ("OPENCLAW_STATE_DIR".to_string(), STATE_CONTAINER_PATH.to_string()),
            ]),
            healthcheck: Some(Healthcheck {
                test: ["CMD", "openclaw", "health", "--json"].map(String::from).to_vec(),
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
        if target.container_id.is_empty() {
            return Ok(Health {
                ok: false,
                detail: "no container ID".to_string(),
            });
        }
        let output = match engine
            .exec(&target.container_id, &["openclaw", "health", "--json"], HEALTH_TIMEOUT)
            .await
        {
            Ok(o) => o,
            Err(e) => {
                return Ok(Health {
                    ok: false,
                    detail: format!("exec failed: {e:#}"),
                });
            }
        };
        Ok(parse_health_json(&output.stdout).unwrap_or_else(|e| Health {
            ok: false,
            detail: format!("parse failed: {e}"),
        }))
    }
}
