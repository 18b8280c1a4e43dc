//! Health and prerequisite check types, and the probe-output parser.
//!
//! Pure functions only: probe output and container state come in as data.

use serde::{Deserialize, Serialize};

use crate::domain::error::HealthParseError;

// ── Probe result ──────────────────────────────────────────────────────────────

/// Structural health reported by a driver probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Health {
    pub ok: bool,
    pub detail: String,
}

#[derive(Deserialize)]
struct ProbeStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    detail: String,
}

/// Parse the JSON status object printed by an in-container health command.
///
/// Anything before the first `{` is treated as noise (plugin banners,
/// warnings). `ok` is `status == "ok"`.
///
/// # Errors
///
/// Returns `HealthParseError::NoJson` when the output contains no `{`, and
/// `HealthParseError::InvalidJson` when the tail is not a JSON object.
pub fn parse_health_json(stdout: &[u8]) -> Result<Health, HealthParseError> {
    let text = String::from_utf8_lossy(stdout);
    let start = text.find('{').ok_or(HealthParseError::NoJson)?;
    let probe: ProbeStatus = serde_json::from_str(&text[start..])?;
    Ok(Health {
        ok: probe.status == "ok",
        detail: probe.detail,
    })
}

// ── Container health table ────────────────────────────────────────────────────

/// Engine-reported state for a container without a claw driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerState {
    pub running: bool,
    pub status: String,
    /// Native healthcheck status, empty when the container has none.
    pub health: String,
}

/// One line of `claw health` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRow {
    pub service: String,
    pub status: String,
    pub detail: String,
}

impl HealthRow {
    #[must_use]
    pub fn from_probe(service: &str, health: &Health) -> Self {
        Self {
            service: service.to_string(),
            status: if health.ok { "healthy" } else { "unhealthy" }.to_string(),
            detail: health.detail.clone(),
        }
    }

    #[must_use]
    pub fn error(service: &str, detail: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            status: "error".to_string(),
            detail: detail.into(),
        }
    }

    /// Row for a container that has no claw driver.
    #[must_use]
    pub fn native(service: &str, state: &ContainerState) -> Self {
        let (status, detail) = if !state.health.is_empty() {
            (state.health.as_str(), "native docker healthcheck")
        } else if state.running {
            ("running", "native (no claw driver)")
        } else if !state.status.is_empty() {
            (state.status.as_str(), "native (no claw driver)")
        } else {
            ("unknown", "native (no claw driver)")
        };
        Self {
            service: service.to_string(),
            status: status.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// First 12 characters of a container ID.
#[must_use]
pub fn short_container_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

// ── Prerequisites ─────────────────────────────────────────────────────────────

/// Outcome of one `claw doctor` probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl CheckResult {
    /// Build a result from a probe's exit status and combined output.
    ///
    /// A successful probe is OK only when it printed a version line.
    #[must_use]
    pub fn from_output(name: &str, success: bool, output: &str) -> Self {
        if !success {
            return Self {
                name: name.to_string(),
                ok: false,
                version: String::new(),
                detail: output.trim().to_string(),
            };
        }
        let version = output.trim().lines().next().unwrap_or_default().trim();
        Self {
            name: name.to_string(),
            ok: !version.is_empty(),
            version: version.to_string(),
            detail: String::new(),
        }
    }
}

/// Names of the checks that failed.
#[must_use]
pub fn collect_issues(checks: &[CheckResult]) -> Vec<String> {
    checks
        .iter()
        .filter(|c| !c.ok)
        .map(|c| {
            if c.detail.is_empty() {
                format!("{} is not available", c.name)
            } else {
                format!("{} is not available: {}", c.name, c.detail)
            }
        })
        .collect()
}
