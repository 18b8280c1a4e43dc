//! Read-only summary of a compiled pod, written to
//! `.claw-runtime/pod-manifest.json` and consumed by clawctl and health tooling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::handles::{ChannelConfig, HandleInfo, Invocation};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodManifest {
    pub pod_name: String,
    pub services: BTreeMap<String, ServiceManifest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<ProxyManifest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceManifest {
    pub image_ref: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub claw_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub agent: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,
    pub count: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub handles: BTreeMap<String, HandleInfo>,
    /// Other claw services' handles, keyed by service name then platform
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_handles: BTreeMap<String, BTreeMap<String, HandleInfo>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<SurfaceManifest>,
    /// Skill basenames only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<Invocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cllama: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceManifest {
    pub scheme: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_mode: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_config: Option<ChannelConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyManifest {
    pub proxy_type: String,
    pub service_name: String,
    pub image: String,
}
