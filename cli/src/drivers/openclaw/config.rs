//! `openclaw.json` generation.
//!
//! Order of application: gateway and workspace defaults, models, proxy
//! wiring, handle defaults, channel surfaces, then CONFIGURE. Later steps
//! overwrite earlier ones where paths overlap.

use std::collections::BTreeSet;

use claw_common::{ChannelConfig, HandleInfo};
use serde_json::{Value, json};

use super::DRIVER;
use crate::domain::config_doc::ConfigDoc;
use crate::domain::error::MaterializationError;
use crate::domain::resolved::ResolvedClaw;
use crate::domain::surface::SCHEME_CHANNEL;
use crate::drivers::shared::{apply_configures, collect_providers, proxy_base_url, set};

type Result<T> = std::result::Result<T, MaterializationError>;

/// Build the openclaw config document for `rc`.
///
/// # Errors
///
/// Returns `MaterializationError` for path conflicts and malformed
/// CONFIGURE commands.
pub fn generate_config(rc: &ResolvedClaw) -> Result<ConfigDoc> {
    let mut doc = ConfigDoc::new();
    set(DRIVER, &mut doc, "gateway.mode", "local")?;
    set(DRIVER, &mut doc, "agents.defaults.workspace", "/claw")?;

    for (slot, model) in &rc.models {
        if slot == "fallback" {
            set(DRIVER, &mut doc, "agents.defaults.model.fallbacks", json!([model]))?;
        } else {
            set(DRIVER, &mut doc, &format!("agents.defaults.model.{slot}"), model.as_str())?;
        }
    }

    if let Some(proxy) = rc.cllama_proxy() {
        let base_url = proxy_base_url(proxy);
        for provider in collect_providers(&rc.models) {
            let base = format!("models.providers.{provider}");
            set(DRIVER, &mut doc, &format!("{base}.baseUrl"), base_url.as_str())?;
            set(DRIVER, &mut doc, &format!("{base}.apiKey"), rc.cllama_token.as_str())?;
        }
    }

    for (platform, handle) in &rc.handles {
        match platform.as_str() {
            "discord" => apply_discord_handle(&mut doc, rc, handle)?,
            "slack" | "telegram" => {
                set(DRIVER, &mut doc, &format!("channels.{platform}.enabled"), true)?;
            }
            other => {
                tracing::warn!(platform = other, "openclaw has no config mapping for HANDLE platform; skipping channel enablement");
            }
        }
    }

    for surface in &rc.surfaces {
        if surface.scheme != SCHEME_CHANNEL {
            continue;
        }
        if let (Some(cc), "discord") = (&surface.channel_config, surface.target.as_str()) {
            apply_discord_surface(&mut doc, cc)?;
        }
    }

    apply_configures(DRIVER, DRIVER, &mut doc, &rc.configures)?;
    Ok(doc)
}

fn apply_discord_handle(doc: &mut ConfigDoc, rc: &ResolvedClaw, handle: &HandleInfo) -> Result<()> {
    set(DRIVER, doc, "channels.discord.enabled", true)?;
    set(DRIVER, doc, "channels.discord.token", "${DISCORD_BOT_TOKEN}")?;
    set(DRIVER, doc, "channels.discord.groupPolicy", "allowlist")?;
    set(DRIVER, doc, "channels.discord.dmPolicy", "allowlist")?;
    // Peer agents must be able to mention each other.
    set(DRIVER, doc, "channels.discord.allowBots", true)?;

    let username = if handle.username.is_empty() {
        rc.service_name.as_str()
    } else {
        handle.username.as_str()
    };
    let mut patterns = Vec::new();
    if !username.is_empty() {
        patterns.push(format!(r"(?i)\b@?{}\b", regex::escape(username)));
    }
    if !handle.id.is_empty() {
        patterns.push(format!("<@!?{}>", handle.id));
    }

    let mut agent = json!({ "id": "main", "name": capitalize(username) });
    if !patterns.is_empty() {
        agent["groupChat"] = json!({ "mentionPatterns": patterns });
    }
    set(DRIVER, doc, "agents.list", json!([agent]))?;

    if !handle.guilds.is_empty() {
        let bot_ids = discord_bot_ids(rc);
        let mut guilds = serde_json::Map::new();
        for guild in &handle.guilds {
            let mut entry = json!({ "requireMention": true });
            if !bot_ids.is_empty() {
                entry["users"] = json!(bot_ids);
            }
            if !guild.channels.is_empty() {
                let channels: serde_json::Map<String, Value> = guild
                    .channels
                    .iter()
                    .map(|c| (c.id.clone(), json!({ "allow": true, "requireMention": true })))
                    .collect();
                entry["channels"] = Value::Object(channels);
            }
            guilds.insert(guild.id.clone(), entry);
        }
        set(DRIVER, doc, "channels.discord.guilds", Value::Object(guilds))?;
    }

    // Pre-enabled so the gateway's startup doctor has nothing to rewrite.
    set(DRIVER, doc, "plugins.entries.discord.enabled", true)
}

fn apply_discord_surface(doc: &mut ConfigDoc, cc: &ChannelConfig) -> Result<()> {
    if !cc.dm.policy.is_empty() {
        set(DRIVER, doc, "channels.discord.dmPolicy", cc.dm.policy.as_str())?;
    }
    if !cc.dm.allow_from.is_empty() {
        set(DRIVER, doc, "channels.discord.allowFrom", json!(cc.dm.allow_from))?;
    }
    for (guild_id, guild) in &cc.guilds {
        let base = format!("channels.discord.guilds.{guild_id}");
        if !guild.policy.is_empty() {
            set(DRIVER, doc, &format!("{base}.policy"), guild.policy.as_str())?;
        }
        if guild.require_mention {
            set(DRIVER, doc, &format!("{base}.requireMention"), true)?;
        }
        if !guild.users.is_empty() {
            set(DRIVER, doc, &format!("{base}.users"), json!(guild.users))?;
        }
    }
    Ok(())
}

/// Own and peer discord bot IDs, sorted and deduplicated.
fn discord_bot_ids(rc: &ResolvedClaw) -> Vec<String> {
    rc.handles
        .get("discord")
        .into_iter()
        .chain(rc.peer_handles.values().filter_map(|h| h.get("discord")))
        .filter(|h| !h.id.is_empty())
        .map(|h| h.id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars
        .next()
        .map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::collections::BTreeMap;

    use claw_common::{ChannelDmConfig, ChannelGuildConfig, ChannelInfo, GuildInfo};

    use super::*;
    use crate::domain::surface::Surface;

    fn discord_rc() -> ResolvedClaw {
        ResolvedClaw {
            service_name: "tiverton".into(),
            claw_type: "openclaw".into(),
            handles: BTreeMap::from([(
                "discord".to_string(),
                HandleInfo {
                    id: "111".into(),
                    username: "tiverton".into(),
                    guilds: vec![GuildInfo {
                        id: "900".into(),
                        name: "Ops".into(),
                        channels: vec![ChannelInfo {
                            id: "42".into(),
                            name: "general".into(),
                        }],
                    }],
                },
            )]),
            peer_handles: BTreeMap::from([(
                "westin".to_string(),
                BTreeMap::from([(
                    "discord".to_string(),
                    HandleInfo {
                        id: "222".into(),
                        ..HandleInfo::default()
                    },
                )]),
            )]),
            ..ResolvedClaw::default()
        }
    }

    #[test]
    fn test_generate_config_sets_gateway_and_workspace() {
        let doc = generate_config(&ResolvedClaw::default()).expect("config");
        assert_eq!(doc.get("gateway.mode"), Some(&json!("local")));
        assert_eq!(doc.get("agents.defaults.workspace"), Some(&json!("/claw")));
    }

    #[test]
    fn test_generate_config_fallback_model_becomes_list() {
        let rc = ResolvedClaw {
            models: BTreeMap::from([
                ("primary".to_string(), "openrouter/anthropic/claude-sonnet-4".to_string()),
                ("fallback".to_string(), "anthropic/claude-haiku".to_string()),
            ]),
            ..ResolvedClaw::default()
        };
        let doc = generate_config(&rc).expect("config");
        assert_eq!(
            doc.get("agents.defaults.model.fallbacks"),
            Some(&json!(["anthropic/claude-haiku"]))
        );
        assert_eq!(
            doc.get("agents.defaults.model.primary"),
            Some(&json!("openrouter/anthropic/claude-sonnet-4"))
        );
    }

    #[test]
    fn test_generate_config_discord_handle_defaults() {
        let doc = generate_config(&discord_rc()).expect("config");
        assert_eq!(doc.get("channels.discord.token"), Some(&json!("${DISCORD_BOT_TOKEN}")));
        assert_eq!(doc.get("channels.discord.allowBots"), Some(&json!(true)));
        assert_eq!(doc.get("plugins.entries.discord.enabled"), Some(&json!(true)));
        assert_eq!(
            doc.get("channels.discord.guilds.900.users"),
            Some(&json!(["111", "222"]))
        );
        assert_eq!(
            doc.get("channels.discord.guilds.900.channels.42"),
            Some(&json!({ "allow": true, "requireMention": true }))
        );
        let agents = doc.get("agents.list").expect("agents.list");
        assert_eq!(agents[0]["name"], "Tiverton");
        assert_eq!(
            agents[0]["groupChat"]["mentionPatterns"],
            json!([r"(?i)\b@?tiverton\b", "<@!?111>"])
        );
    }

    #[test]
    fn test_generate_config_mention_pattern_escapes_regex() {
        let mut rc = discord_rc();
        if let Some(h) = rc.handles.get_mut("discord") {
            h.username = "bot.v2".into();
        }
        let doc = generate_config(&rc).expect("config");
        let agents = doc.get("agents.list").expect("agents.list");
        assert_eq!(agents[0]["groupChat"]["mentionPatterns"][0], r"(?i)\b@?bot\.v2\b");
    }

    #[test]
    fn test_generate_config_configure_overrides_handle_default() {
        let mut rc = discord_rc();
        rc.configures = vec!["openclaw config set channels.discord.dmPolicy open".into()];
        let doc = generate_config(&rc).expect("config");
        assert_eq!(doc.get("channels.discord.dmPolicy"), Some(&json!("open")));
    }

    #[test]
    fn test_generate_config_channel_surface_refines_guild() {
        let mut rc = discord_rc();
        rc.surfaces = vec![Surface {
            scheme: "channel".into(),
            target: "discord".into(),
            channel_config: Some(ChannelConfig {
                dm: ChannelDmConfig {
                    enabled: true,
                    policy: "pairing".into(),
                    allow_from: vec!["333".into()],
                },
                guilds: BTreeMap::from([(
                    "900".to_string(),
                    ChannelGuildConfig {
                        policy: "open".into(),
                        require_mention: false,
                        users: vec![],
                    },
                )]),
            }),
            ..Surface::default()
        }];
        let doc = generate_config(&rc).expect("config");
        assert_eq!(doc.get("channels.discord.dmPolicy"), Some(&json!("pairing")));
        assert_eq!(doc.get("channels.discord.allowFrom"), Some(&json!(["333"])));
        assert_eq!(doc.get("channels.discord.guilds.900.policy"), Some(&json!("open")));
        assert_eq!(doc.get("channels.discord.guilds.900.requireMention"), Some(&json!(true)));
    }

    #[test]
    fn test_generate_config_cllama_rewrites_providers() {
        let rc = ResolvedClaw {
            models: BTreeMap::from([(
                "primary".to_string(),
                "openrouter/anthropic/claude-sonnet-4".to_string(),
            )]),
            cllama: vec!["passthrough".into()],
            cllama_token: "bot:abc".into(),
            ..ResolvedClaw::default()
        };
        let doc = generate_config(&rc).expect("config");
        assert_eq!(
            doc.get("models.providers.openrouter.baseUrl"),
            Some(&json!("http://cllama-passthrough:8080/v1"))
        );
        assert_eq!(doc.get("models.providers.openrouter.apiKey"), Some(&json!("bot:abc")));
    }

    #[test]
    fn test_generate_config_slack_handle_enables_channel() {
        let rc = ResolvedClaw {
            handles: BTreeMap::from([("slack".to_string(), HandleInfo::default())]),
            ..ResolvedClaw::default()
        };
        let doc = generate_config(&rc).expect("config");
        assert_eq!(doc.get("channels.slack.enabled"), Some(&json!(true)));
    }

    #[test]
    fn test_generate_config_is_deterministic() {
        let a = generate_config(&discord_rc()).expect("config").to_pretty_json().expect("json");
        let b = generate_config(&discord_rc()).expect("config").to_pretty_json().expect("json");
        assert_eq!(a, b);
    }
}
