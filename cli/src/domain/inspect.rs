//! Claw metadata decoded from image labels.

use std::collections::BTreeMap;

use claw_common::labels::{image, index_of};
use serde::Serialize;

use crate::domain::clawfile::{ClawConfig, ScheduledCommand};

/// Typed view of an image's `claw.*` labels.
///
/// An image without `claw.type` decodes to an empty `claw_type`; callers
/// treat it as a plain (non-claw) image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClawInfo {
    pub claw_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,
    /// Proxy types, split from the comma-separated label value
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cllama: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    /// Raw SURFACE declarations in declared order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// In-image path of a skill this image publishes for its consumers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_emit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invocations: Vec<ScheduledCommand>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub privileges: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configures: Vec<String>,
    /// Sorted platform tags
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub handles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<String>,
}

/// Collects `prefix.N` labels and yields their values in numeric order.
#[derive(Default)]
struct Indexed<'a> {
    entries: Vec<(usize, &'a str, &'a str)>,
}

impl<'a> Indexed<'a> {
    fn push(&mut self, key: &'a str, prefix: &str, value: &'a str) {
        let index = index_of(key, prefix).unwrap_or(usize::MAX);
        self.entries.push((index, key, value));
    }

    fn into_values(mut self) -> Vec<String> {
        self.entries.sort_unstable();
        self.entries.into_iter().map(|(_, _, v)| v.to_string()).collect()
    }
}

impl ClawInfo {
    /// Decode `claw.*` labels. Other labels are ignored.
    #[must_use]
    pub fn from_labels<K, V, I>(labels: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs: Vec<(K, V)> = labels.into_iter().collect();
        let mut info = Self::default();
        let mut surfaces = Indexed::default();
        let mut skills = Indexed::default();
        let mut tracks = Indexed::default();
        let mut configures = Indexed::default();
        let mut invocations = Indexed::default();

        for (key, value) in &pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if !key.starts_with(image::PREFIX) {
                continue;
            }
            match key {
                image::TYPE => info.claw_type = value.to_string(),
                image::AGENT_FILE => info.agent = Some(value.to_string()),
                image::CLLAMA_DEFAULT => info.cllama = split_cllama(value),
                image::PERSONA_DEFAULT => info.persona = Some(value.to_string()),
                image::SKILL_EMIT => info.skill_emit = Some(value.to_string()),
                _ => {
                    if let Some(slot) = key.strip_prefix(image::MODEL) {
                        info.models.insert(slot.to_string(), value.to_string());
                    } else if let Some(mode) = key.strip_prefix(image::PRIVILEGE) {
                        info.privileges.insert(mode.to_string(), value.to_string());
                    } else if let Some(platform) = key.strip_prefix(image::HANDLE) {
                        info.handles.push(platform.to_string());
                    } else if key.starts_with(image::SURFACE) {
                        surfaces.push(key, image::SURFACE, value);
                    } else if key.starts_with(image::SKILL) {
                        skills.push(key, image::SKILL, value);
                    } else if key.starts_with(image::TRACK) {
                        tracks.push(key, image::TRACK, value);
                    } else if key.starts_with(image::CONFIGURE) {
                        configures.push(key, image::CONFIGURE, value);
                    } else if key.starts_with(image::INVOKE) {
                        invocations.push(key, image::INVOKE, value);
                    }
                }
            }
        }

        info.handles.sort();
        info.surfaces = surfaces.into_values();
        info.skills = skills.into_values();
        info.tracks = tracks.into_values();
        info.configures = configures.into_values();
        info.invocations = invocations
            .into_values()
            .into_iter()
            .filter_map(|v| {
                let (schedule, command) = v.split_once('\t')?;
                Some(ScheduledCommand {
                    schedule: schedule.to_string(),
                    command: command.to_string(),
                })
            })
            .collect();
        info
    }

    /// Whether the image carries a `claw.type` label.
    #[must_use]
    pub fn is_claw(&self) -> bool {
        !self.claw_type.is_empty()
    }
}

impl From<&ClawConfig> for ClawInfo {
    fn from(config: &ClawConfig) -> Self {
        let mut handles = config.handles.clone();
        handles.sort();
        Self {
            claw_type: config.claw_type.clone(),
            agent: config.agent.clone(),
            models: config.models.clone(),
            cllama: config.cllama.as_deref().map(split_cllama).unwrap_or_default(),
            persona: config.persona.clone(),
            surfaces: config.surfaces.iter().map(|s| s.raw.clone()).collect(),
            skills: config.skills.clone(),
            skill_emit: None,
            invocations: config.invocations.clone(),
            privileges: config.privileges.clone(),
            configures: config.configures.clone(),
            handles,
            tracks: config.tracks.clone(),
        }
    }
}

/// Split a comma-separated proxy list, dropping blanks.
#[must_use]
pub fn split_cllama(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
