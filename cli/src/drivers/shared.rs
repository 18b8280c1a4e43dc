//! Behaviour common to every driver: fail-closed checks, CONFIGURE
//! application, CLAWDAPUS.md, and container-state probes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use claw_common::platform_token_var;
use serde_json::Value;

use crate::application::ports::ContainerEngine;
use crate::domain::config_doc::{ConfigDoc, parse_config_set};
use crate::domain::error::{MaterializationError, ValidationError};
use crate::domain::health::{Health, short_container_id};
use crate::domain::markdown::clawdapus_md;
use crate::domain::resolved::{ContainerRef, MaterializeOpts, ResolvedClaw};
use crate::runtime::files::write_file;

/// Container path of the generated pod context document.
pub const CLAWDAPUS_MD_PATH: &str = "/claw/CLAWDAPUS.md";

/// Environment every managed container receives.
pub const CLAW_MANAGED: (&str, &str) = ("CLAW_MANAGED", "true");

// ── Validation ────────────────────────────────────────────────────────────────

/// The contract host path must be set and point at an existing file.
///
/// # Errors
///
/// Returns `MissingContract` or `ContractNotFound`.
pub fn require_contract(driver: &'static str, rc: &ResolvedClaw) -> Result<(), ValidationError> {
    if rc.agent_host_path.as_os_str().is_empty() {
        return Err(ValidationError::MissingContract { driver });
    }
    if std::fs::metadata(&rc.agent_host_path).is_err() {
        return Err(ValidationError::ContractNotFound {
            driver,
            path: rc.agent_host_path.display().to_string(),
        });
    }
    Ok(())
}

/// Every handle on a known platform needs its bot token in the service
/// environment. Unknown platforms are skipped with a warning.
///
/// # Errors
///
/// Returns `MissingTokenEnv` for the first platform whose token is absent
/// or resolves to an empty value.
pub fn require_handle_tokens(driver: &'static str, rc: &ResolvedClaw) -> Result<(), ValidationError> {
    for platform in rc.handles.keys() {
        let Some(var) = platform_token_var(platform) else {
            tracing::warn!(driver, platform = %platform, "no token convention for HANDLE platform; skipping check");
            continue;
        };
        if env_token(&rc.environment, var).is_empty() {
            return Err(ValidationError::MissingTokenEnv {
                driver,
                platform: platform.clone(),
                var,
            });
        }
    }
    Ok(())
}

/// Every CONFIGURE must be `<runtime> config set <path> <value>`.
///
/// # Errors
///
/// Returns `UnsupportedConfigure` naming the first offending command.
pub fn require_configure_prefix(
    driver: &'static str,
    runtime: &str,
    prefix: &'static str,
    rc: &ResolvedClaw,
) -> Result<(), ValidationError> {
    match rc.configures.iter().find(|c| parse_config_set(runtime, c).is_none()) {
        Some(command) => Err(ValidationError::UnsupportedConfigure {
            driver,
            command: command.clone(),
            prefix,
        }),
        None => Ok(()),
    }
}

/// Value of `key` in `env`, with `${NAME}` and `$NAME` placeholders
/// resolved against the process environment. Empty when unset.
#[must_use]
pub fn env_token(env: &BTreeMap<String, String>, key: &str) -> String {
    env.get(key).map(|raw| resolve_env_token(raw)).unwrap_or_default()
}

/// Resolve a single env value that may be a placeholder.
#[must_use]
pub fn resolve_env_token(raw: &str) -> String {
    let value = raw.trim();
    if let Some(name) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        let name = name.trim();
        if name.is_empty() {
            return String::new();
        }
        return process_env(name);
    }
    if let Some(name) = value.strip_prefix('$')
        && is_env_var_name(name.trim())
    {
        return process_env(name.trim());
    }
    value.to_string()
}

fn process_env(name: &str) -> String {
    std::env::var(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn is_env_var_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

// ── Config documents ──────────────────────────────────────────────────────────

/// `doc.set` with the error tagged by driver.
///
/// # Errors
///
/// Returns `MaterializationError::ConfigPath` on a path conflict.
pub fn set(
    driver: &'static str,
    doc: &mut ConfigDoc,
    path: &str,
    value: impl Into<Value>,
) -> Result<(), MaterializationError> {
    doc.set(path, value)
        .map_err(|source| MaterializationError::ConfigPath { driver, source })
}

/// Apply CONFIGURE commands in declared order.
///
/// # Errors
///
/// Returns `Configure` for a command of the wrong shape and `ConfigPath`
/// for a conflicting assignment.
pub fn apply_configures(
    driver: &'static str,
    runtime: &str,
    doc: &mut ConfigDoc,
    configures: &[String],
) -> Result<(), MaterializationError> {
    for command in configures {
        let (path, value) =
            parse_config_set(runtime, command).ok_or_else(|| MaterializationError::Configure {
                driver,
                command: command.clone(),
            })?;
        set(driver, doc, &path, value)?;
    }
    Ok(())
}

/// `http://cllama-<type>:8080/v1`
#[must_use]
pub fn proxy_base_url(proxy_type: &str) -> String {
    format!("http://cllama-{proxy_type}:8080/v1")
}

/// Split `provider/model`; a bare model belongs to `anthropic`.
#[must_use]
pub fn split_model_ref(reference: &str) -> Option<(String, String)> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.split_once('/') {
        None => Some(("anthropic".to_string(), trimmed.to_string())),
        Some((provider, model)) => {
            let provider = provider.trim().to_ascii_lowercase();
            let model = model.trim();
            (!provider.is_empty() && !model.is_empty()).then(|| (provider, model.to_string()))
        }
    }
}

/// Distinct providers referenced by the model slots, sorted.
#[must_use]
pub fn collect_providers(models: &BTreeMap<String, String>) -> Vec<String> {
    models
        .values()
        .filter_map(|m| split_model_ref(m).map(|(p, _)| p))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ── Runtime files ─────────────────────────────────────────────────────────────

/// Pod name for generated documents, falling back to the service name.
#[must_use]
pub fn pod_name<'a>(rc: &'a ResolvedClaw, opts: &'a MaterializeOpts) -> &'a str {
    if opts.pod_name.is_empty() {
        &rc.service_name
    } else {
        &opts.pod_name
    }
}

/// Write a runtime artifact with the error tagged by driver.
///
/// # Errors
///
/// Returns `MaterializationError::Io`.
pub fn write_runtime_file(
    driver: &'static str,
    path: &Path,
    content: impl AsRef<[u8]>,
    mode: u32,
) -> Result<(), MaterializationError> {
    tracing::debug!(driver, path = %path.display(), "writing runtime file");
    write_file(path, content, mode).map_err(|source| MaterializationError::Io {
        driver,
        path: path.display().to_string(),
        source,
    })
}

/// Write `<runtime>/CLAWDAPUS.md` and return its host path.
///
/// # Errors
///
/// Returns `MaterializationError::Io`.
pub fn write_clawdapus_md(
    driver: &'static str,
    rc: &ResolvedClaw,
    opts: &MaterializeOpts,
) -> Result<PathBuf, MaterializationError> {
    let path = opts.runtime_dir.join("CLAWDAPUS.md");
    write_runtime_file(driver, &path, clawdapus_md(rc, pod_name(rc, opts)), 0o644)?;
    Ok(path)
}

/// Encode a config document as two-space JSON with a trailing newline.
///
/// # Errors
///
/// Returns `MaterializationError::Encode`.
pub fn render_config(
    driver: &'static str,
    doc: &ConfigDoc,
) -> Result<String, MaterializationError> {
    let mut json = doc.to_pretty_json().map_err(|source| MaterializationError::Encode {
        driver,
        what: "config",
        source,
    })?;
    json.push('\n');
    Ok(json)
}

// ── Container probes ──────────────────────────────────────────────────────────

/// Fail unless the container is running.
///
/// # Errors
///
/// Returns an error for a missing ID, a failed inspect, or a container
/// that is not running.
pub async fn ensure_running(
    driver: &'static str,
    container_id: &str,
    engine: &dyn ContainerEngine,
) -> Result<()> {
    if container_id.is_empty() {
        bail!("{driver} driver: post-apply check failed: no container ID");
    }
    let details = engine.container_details(container_id).await.map_err(|e| {
        anyhow::anyhow!("{driver} driver: post-apply container inspect failed: {e:#}")
    })?;
    if !details.state.running {
        let status = if details.state.status.is_empty() {
            "unknown"
        } else {
            details.state.status.as_str()
        };
        bail!(
            "{driver} driver: container {} not running (status: {status})",
            short_container_id(container_id)
        );
    }
    Ok(())
}

/// Healthy when the container is running.
///
/// # Errors
///
/// Never fails; inspect errors become an unhealthy result.
pub async fn running_health(target: &ContainerRef, engine: &dyn ContainerEngine) -> Result<Health> {
    if target.container_id.is_empty() {
        return Ok(Health {
            ok: false,
            detail: "no container ID".to_string(),
        });
    }
    let health = match engine.container_details(&target.container_id).await {
        Err(e) => Health {
            ok: false,
            detail: format!("inspect: {e:#}"),
        },
        Ok(d) if d.state.running => Health {
            ok: true,
            detail: "container running".to_string(),
        },
        Ok(d) => Health {
            ok: false,
            detail: format!(
                "not running ({})",
                if d.state.status.is_empty() { "unknown" } else { d.state.status.as_str() }
            ),
        },
    };
    Ok(health)
}
