//! Domain types for the operator config at `~/.claw/config.yaml`.
//!
//! Pure functions only. No I/O, no async, no filesystem access.

use serde::{Deserialize, Serialize};

use crate::domain::pod::compose::DEFAULT_CLAWCTL_ADDR;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_CLLAMA_REGISTRY: &str = "ghcr.io/mostlydev";
pub const DEFAULT_CLAWCTL_IMAGE: &str = "ghcr.io/mostlydev/clawctl:latest";
pub const DEFAULT_ENGINE_BINARY: &str = "docker";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClawdapusConfig {
    pub images: ImagesConfig,
    pub dashboard: DashboardConfig,
    pub engine: EngineConfig,
}

/// Where proxy and dashboard images are pulled from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImagesConfig {
    /// Registry prefix for `cllama-<type>` proxy images.
    pub cllama_registry: String,
    pub clawctl: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            cllama_registry: DEFAULT_CLLAMA_REGISTRY.to_string(),
            clawctl: DEFAULT_CLAWCTL_IMAGE.to_string(),
        }
    }
}

impl ImagesConfig {
    /// `<registry>/cllama-<type>:latest`
    #[must_use]
    pub fn cllama_image(&self, proxy_type: &str) -> String {
        let registry = self.cllama_registry.trim().trim_end_matches('/');
        format!("{registry}/cllama-{}:latest", proxy_type.trim())
    }
}

/// The clawctl dashboard service injected into every governed pod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    /// Listen address inside the pod, `[host]:port`.
    pub addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: DEFAULT_CLAWCTL_ADDR.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Effective address: `env_override` (from `CLAWCTL_ADDR`) wins when set.
    #[must_use]
    pub fn effective_addr(&self, env_override: Option<&str>) -> String {
        match env_override.map(str::trim) {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ if self.addr.trim().is_empty() => DEFAULT_CLAWCTL_ADDR.to_string(),
            _ => self.addr.trim().to_string(),
        }
    }
}

/// The container engine CLI the pipeline shells out to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub binary: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_ENGINE_BINARY.to_string(),
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
