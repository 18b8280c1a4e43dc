//! Per-service inputs and outputs of the driver layer.

use std::collections::BTreeMap;
use std::path::PathBuf;

use claw_common::{HandleInfo, Invocation};

use crate::domain::surface::Surface;

/// Image labels merged with pod overrides and resolved host paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedClaw {
    pub service_name: String,
    pub image_ref: String,
    pub claw_type: String,
    /// Contract file name as mounted under `/claw/`.
    pub agent: String,
    /// Canonical host path of the contract.
    pub agent_host_path: PathBuf,
    pub models: BTreeMap<String, String>,
    pub configures: Vec<String>,
    pub privileges: BTreeMap<String, String>,
    pub cllama: Vec<String>,
    /// `<service>:<48 hex>` when a proxy is configured.
    pub cllama_token: String,
    pub persona: Option<String>,
    pub handles: BTreeMap<String, HandleInfo>,
    /// Every other claw service's handles, keyed by service name.
    pub peer_handles: BTreeMap<String, BTreeMap<String, HandleInfo>>,
    pub surfaces: Vec<Surface>,
    pub skills: Vec<ResolvedSkill>,
    pub invocations: Vec<Invocation>,
    pub count: u32,
    pub environment: BTreeMap<String, String>,
}

impl ResolvedClaw {
    /// First configured proxy type, if any.
    #[must_use]
    pub fn cllama_proxy(&self) -> Option<&str> {
        self.cllama.first().map(String::as_str)
    }
}

/// A skill file on the host, keyed by the name it is projected under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSkill {
    pub name: String,
    pub host_path: PathBuf,
}

/// Where a driver writes runtime artifacts.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOpts {
    pub runtime_dir: PathBuf,
    pub pod_name: String,
}

/// How a runtime expects skills laid out under its skill directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkillLayout {
    /// `<dir>/<name>`
    #[default]
    Flat,
    /// `<dir>/<stem>/SKILL.md`
    Directory,
}

/// A bind mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host_path: PathBuf,
    pub container_path: String,
    pub read_only: bool,
}

impl Mount {
    #[must_use]
    pub fn read_only(host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
            read_only: true,
        }
    }

    /// Compose short syntax: `host:container:ro|rw`.
    #[must_use]
    pub fn compose_spec(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host_path.display(),
            self.container_path,
            if self.read_only { "ro" } else { "rw" }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Healthcheck {
    pub test: Vec<String>,
    pub interval: String,
    pub timeout: String,
    pub retries: u32,
}

/// A driver's contribution to its compose service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeResult {
    pub mounts: Vec<Mount>,
    pub tmpfs: Vec<String>,
    /// Wins over pod-level environment.
    pub environment: BTreeMap<String, String>,
    pub healthcheck: Option<Healthcheck>,
    pub read_only: bool,
    pub restart: String,
    /// Container path skills are projected into; empty when the runtime
    /// has no skill directory.
    pub skill_dir: String,
    pub skill_layout: SkillLayout,
}

impl Default for MaterializeResult {
    fn default() -> Self {
        Self {
            mounts: Vec::new(),
            tmpfs: Vec::new(),
            environment: BTreeMap::new(),
            healthcheck: None,
            read_only: true,
            restart: "on-failure".to_string(),
            skill_dir: String::new(),
            skill_layout: SkillLayout::Flat,
        }
    }
}

impl MaterializeResult {
    /// Shape for a service that no driver manages.
    #[must_use]
    pub fn unmanaged() -> Self {
        Self {
            read_only: false,
            restart: String::new(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostApplyOpts {
    pub container_id: String,
}

/// A running container a driver probes.
#[derive(Debug, Clone, Default)]
pub struct ContainerRef {
    pub container_id: String,
    pub service_name: String,
}
