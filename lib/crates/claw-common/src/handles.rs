use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An agent's contact card on one platform.
///
/// Sibling services use it to mention, message, and route to the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandleInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guilds: Vec<GuildInfo>,
}

/// One guild / server / workspace membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<ChannelInfo>,
}

/// A single channel within a guild.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Routing policy attached to a `channel://` surface in map form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    #[serde(default)]
    pub dm: ChannelDmConfig,
    /// Keyed by guild ID.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub guilds: BTreeMap<String, ChannelGuildConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_from: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGuildConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy: String,
    #[serde(default)]
    pub require_mention: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

/// A scheduled agent task, from image labels or pod `x-claw.invoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    /// 5-field cron expression, e.g. `15 8 * * 1-5`
    pub schedule: String,
    /// Agent turn payload
    pub message: String,
    /// Delivery channel ID (empty = runtime default)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    /// Job name (empty = derived from message)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// Conventional env var holding a platform's bot token.
///
/// Returns `None` for platforms with no known convention.
#[must_use]
pub fn platform_token_var(platform: &str) -> Option<&'static str> {
    match platform.to_ascii_lowercase().as_str() {
        "discord" => Some("DISCORD_BOT_TOKEN"),
        "slack" => Some("SLACK_BOT_TOKEN"),
        "telegram" => Some("TELEGRAM_BOT_TOKEN"),
        _ => None,
    }
}
