//! nullclaw `config.json` generation.
//!
//! Tokens are written resolved: nullclaw does not expand environment
//! placeholders in its config file.

use serde_json::json;

use super::DRIVER;
use crate::domain::config_doc::ConfigDoc;
use crate::domain::error::MaterializationError;
use crate::domain::resolved::ResolvedClaw;
use crate::drivers::shared::{apply_configures, collect_providers, env_token, proxy_base_url, set};

type Result<T> = std::result::Result<T, MaterializationError>;

/// Build the nullclaw config document for `rc`.
///
/// # Errors
///
/// Returns `MaterializationError` for path conflicts, malformed CONFIGURE
/// commands, and a proxy-enabled service without a token.
pub fn generate_config(rc: &ResolvedClaw) -> Result<ConfigDoc> {
    let mut doc = ConfigDoc::new();
    set(DRIVER, &mut doc, "gateway.port", 3000)?;
    set(DRIVER, &mut doc, "gateway.host", "127.0.0.1")?;
    set(DRIVER, &mut doc, "gateway.require_pairing", true)?;
    set(DRIVER, &mut doc, "autonomy.level", "supervised")?;
    set(DRIVER, &mut doc, "autonomy.workspace_only", true)?;

    for (slot, model) in &rc.models {
        if slot == "fallback" {
            set(DRIVER, &mut doc, "reliability.fallback_providers", json!([model]))?;
        } else {
            set(DRIVER, &mut doc, &format!("agents.defaults.model.{slot}"), model.as_str())?;
        }
    }

    if let Some(proxy) = rc.cllama_proxy() {
        if rc.cllama_token.trim().is_empty() {
            return Err(MaterializationError::Configure {
                driver: DRIVER,
                command: format!("CLLAMA {proxy} (proxy token is empty)"),
            });
        }
        let base_url = proxy_base_url(proxy);
        for provider in collect_providers(&rc.models) {
            let base = format!("models.providers.{provider}");
            set(DRIVER, &mut doc, &format!("{base}.base_url"), base_url.as_str())?;
            set(DRIVER, &mut doc, &format!("{base}.api_key"), rc.cllama_token.as_str())?;
        }
    }

    let env = &rc.environment;
    for (platform, handle) in &rc.handles {
        match platform.to_ascii_lowercase().as_str() {
            "discord" => {
                let token = env_token(env, "DISCORD_BOT_TOKEN");
                if !token.is_empty() {
                    set(DRIVER, &mut doc, "channels.discord.accounts.main.token", token)?;
                }
                if let Some(guild) = handle.guilds.iter().map(|g| g.id.trim()).find(|g| !g.is_empty()) {
                    set(DRIVER, &mut doc, "channels.discord.accounts.main.guild_id", guild)?;
                }
            }
            "telegram" => {
                let token = env_token(env, "TELEGRAM_BOT_TOKEN");
                if !token.is_empty() {
                    set(DRIVER, &mut doc, "channels.telegram.accounts.main.bot_token", token)?;
                }
            }
            "slack" => apply_slack(&mut doc, rc)?,
            other => {
                tracing::warn!(platform = other, "nullclaw has no config mapping for HANDLE platform; skipping channel enablement");
            }
        }
    }

    apply_configures(DRIVER, DRIVER, &mut doc, &rc.configures)?;
    Ok(doc)
}

fn apply_slack(doc: &mut ConfigDoc, rc: &ResolvedClaw) -> Result<()> {
    let env = &rc.environment;
    let base = "channels.slack.accounts.main";
    let bot_token = env_token(env, "SLACK_BOT_TOKEN");
    if !bot_token.is_empty() {
        set(DRIVER, doc, &format!("{base}.bot_token"), bot_token)?;
    }
    let app_token = env_token(env, "SLACK_APP_TOKEN");
    if !app_token.is_empty() {
        set(DRIVER, doc, &format!("{base}.app_token"), app_token.as_str())?;
        set(DRIVER, doc, &format!("{base}.mode"), "socket")?;
    }
    let secret = env_token(env, "SLACK_SIGNING_SECRET");
    if !secret.is_empty() {
        set(DRIVER, doc, &format!("{base}.signing_secret"), secret)?;
        if app_token.is_empty() {
            set(DRIVER, doc, &format!("{base}.mode"), "http")?;
        }
    }
    Ok(())
}
