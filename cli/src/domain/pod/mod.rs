//! The pod manifest (`claw-pod.yml`): typed services and their `x-claw`
//! blocks, and the compose document generated from them.

pub mod compose;
pub mod parser;

use std::collections::BTreeMap;

use claw_common::{HandleInfo, Invocation};

use crate::domain::surface::Surface;

pub use compose::{ClawctlConfig, CllamaProxyConfig, EmitOptions, emit_compose};
pub use parser::{container_port, parse_pod};

/// Name of the pod-internal network every claw service joins.
pub const CLAW_NETWORK: &str = "claw-internal";

/// A parsed pod manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pod {
    /// `x-claw.pod`; empty when unset.
    pub name: String,
    pub services: BTreeMap<String, Service>,
}

impl Pod {
    /// Whether any service carries an `x-claw` block.
    #[must_use]
    pub fn has_claw_services(&self) -> bool {
        self.services.values().any(|s| s.claw.is_some())
    }
}

/// One `services.<name>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Service {
    pub image: String,
    pub environment: BTreeMap<String, String>,
    pub expose: Vec<String>,
    /// Container-side ports only, protocol suffix dropped.
    pub ports: Vec<String>,
    pub claw: Option<ClawBlock>,
}

/// The `x-claw` block of a governed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClawBlock {
    pub agent: Option<String>,
    pub persona: Option<String>,
    pub cllama: Vec<String>,
    /// Proxy-only environment, never injected into the agent container.
    pub cllama_env: BTreeMap<String, String>,
    /// Always at least 1.
    pub count: u32,
    /// Lowercased platform → contact card.
    pub handles: BTreeMap<String, HandleInfo>,
    pub surfaces: Vec<Surface>,
    pub skills: Vec<String>,
    pub invoke: Vec<Invocation>,
}

impl Default for ClawBlock {
    fn default() -> Self {
        Self {
            agent: None,
            persona: None,
            cllama: Vec::new(),
            cllama_env: BTreeMap::new(),
            count: 1,
            handles: BTreeMap::new(),
            surfaces: Vec::new(),
            skills: Vec::new(),
            invoke: Vec::new(),
        }
    }
}

impl ClawBlock {
    /// Compose service names this block expands to: `name` for a single
    /// replica, `name-0 .. name-(count-1)` otherwise.
    #[must_use]
    pub fn ordinal_names(&self, name: &str) -> Vec<String> {
        expand_ordinals(name, self.count)
    }
}

/// Compose service names for `count` replicas of `name`.
#[must_use]
pub fn expand_ordinals(name: &str, count: u32) -> Vec<String> {
    if count <= 1 {
        return vec![name.to_string()];
    }
    (0..count).map(|i| format!("{name}-{i}")).collect()
}
