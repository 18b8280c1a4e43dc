//! microclaw `microclaw.config.yaml` generation.
//!
//! The document is built as a [`ConfigDoc`] and encoded as YAML. CONFIGURE
//! values are typed with YAML rules rather than JSON ones, so `30m` stays a
//! string and `[a, b]` becomes a list.

use std::collections::{BTreeMap, BTreeSet};

use claw_common::HandleInfo;
use serde_json::{Value, json};

use super::DRIVER;
use crate::domain::config_doc::{ConfigDoc, split_config_set};
use crate::domain::error::MaterializationError;
use crate::domain::resolved::ResolvedClaw;
use crate::drivers::shared::{env_token, proxy_base_url, set, split_model_ref};

type Result<T> = std::result::Result<T, MaterializationError>;

/// Container path the config file is mounted at.
pub const CONFIG_CONTAINER_PATH: &str = "/app/config/microclaw.config.yaml";

/// Mount point of the writable data directory.
pub const DATA_DIR: &str = "/claw-data";

const WEB_PORT: u16 = 10961;

/// Providers that run without an API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama"];

/// The primary model as `(provider, model)`.
///
/// # Errors
///
/// Returns a description of what is wrong with the MODEL directives.
pub fn primary_model(models: &BTreeMap<String, String>) -> std::result::Result<(String, String), String> {
    let reference = models.get("primary").map_or("", |m| m.trim());
    if reference.is_empty() {
        return Err("missing MODEL primary (set `MODEL primary <provider/model>` in Clawfile)".to_string());
    }
    split_model_ref(reference)
        .ok_or_else(|| format!("invalid MODEL primary {reference:?} (expected provider/model)"))
}

/// Env keys consulted for `provider`'s API key, in lookup order.
#[must_use]
pub fn expected_provider_keys(provider: &str) -> Vec<String> {
    let suffix = provider.to_ascii_uppercase().replace(['-', '.', '/'], "_");
    let mut keys = vec![
        format!("{suffix}_API_KEY"),
        format!("PROVIDER_API_KEY_{suffix}"),
        "PROVIDER_API_KEY".to_string(),
    ];
    if provider != "anthropic" {
        keys.push("OPENAI_API_KEY".to_string());
    }
    let mut seen = BTreeSet::new();
    keys.retain(|k| seen.insert(k.clone()));
    keys
}

/// First non-empty API key for `provider` in the service environment.
#[must_use]
pub fn provider_api_key(provider: &str, env: &BTreeMap<String, String>) -> String {
    expected_provider_keys(provider)
        .iter()
        .map(|key| env_token(env, key))
        .find(|token| !token.is_empty())
        .unwrap_or_default()
}

#[must_use]
pub fn provider_needs_key(provider: &str) -> bool {
    !KEYLESS_PROVIDERS.contains(&provider)
}

/// Build the microclaw config document for `rc`, CONFIGURE commands
/// applied last.
///
/// # Errors
///
/// Returns `MaterializationError` for a missing primary model, a
/// proxy-enabled service without a token, a malformed CONFIGURE, or a
/// path conflict.
pub fn generate_config(rc: &ResolvedClaw) -> Result<ConfigDoc> {
    let (provider, model) = primary_model(&rc.models)
        .map_err(|reason| MaterializationError::Requirement { driver: DRIVER, reason })?;

    let mut doc = ConfigDoc::new();
    set(DRIVER, &mut doc, "data_dir", DATA_DIR)?;
    set(DRIVER, &mut doc, "skills_dir", format!("{DATA_DIR}/skills"))?;
    set(DRIVER, &mut doc, "working_dir", format!("{DATA_DIR}/working_dir"))?;
    set(DRIVER, &mut doc, "working_dir_isolation", "chat")?;
    set(DRIVER, &mut doc, "timezone", "UTC")?;
    set(DRIVER, &mut doc, "web_enabled", true)?;
    set(DRIVER, &mut doc, "web_host", "127.0.0.1")?;
    set(DRIVER, &mut doc, "web_port", WEB_PORT)?;
    set(DRIVER, &mut doc, "channels.web.enabled", true)?;

    if let Some(proxy) = rc.cllama_proxy() {
        if rc.cllama_token.trim().is_empty() {
            return Err(MaterializationError::Requirement {
                driver: DRIVER,
                reason: "CLLAMA is enabled but token is empty".to_string(),
            });
        }
        set(DRIVER, &mut doc, "llm_base_url", proxy_base_url(proxy))?;
        set(DRIVER, &mut doc, "api_key", rc.cllama_token.as_str())?;
        // The proxy speaks the OpenAI dialect for every non-Anthropic provider.
        if provider == "anthropic" {
            set(DRIVER, &mut doc, "llm_provider", "anthropic")?;
            set(DRIVER, &mut doc, "model", model)?;
        } else {
            set(DRIVER, &mut doc, "llm_provider", "openai")?;
            set(DRIVER, &mut doc, "model", format!("{provider}/{model}"))?;
        }
    } else {
        set(DRIVER, &mut doc, "api_key", provider_api_key(&provider, &rc.environment))?;
        set(DRIVER, &mut doc, "llm_provider", provider)?;
        set(DRIVER, &mut doc, "model", model)?;
    }

    let env = &rc.environment;
    for (platform, handle) in &rc.handles {
        let base = format!("channels.{platform}");
        match platform.as_str() {
            "discord" => {
                set(DRIVER, &mut doc, &format!("{base}.enabled"), true)?;
                set_token(&mut doc, &base, "bot_token", env_token(env, "DISCORD_BOT_TOKEN"))?;
                set_username(&mut doc, &base, handle)?;
                let allowed = numeric_ids::<u64>(channel_ids(handle));
                if !allowed.is_empty() {
                    set(DRIVER, &mut doc, &format!("{base}.allowed_channels"), json!(allowed))?;
                }
            }
            "telegram" => {
                set(DRIVER, &mut doc, &format!("{base}.enabled"), true)?;
                set_token(&mut doc, &base, "bot_token", env_token(env, "TELEGRAM_BOT_TOKEN"))?;
                set_username(&mut doc, &base, handle)?;
                let allowed = numeric_ids::<i64>(handle.guilds.iter().map(|g| g.id.as_str()));
                if !allowed.is_empty() {
                    set(DRIVER, &mut doc, &format!("{base}.allowed_groups"), json!(allowed))?;
                }
            }
            "slack" => {
                set(DRIVER, &mut doc, &format!("{base}.enabled"), true)?;
                set_token(&mut doc, &base, "bot_token", env_token(env, "SLACK_BOT_TOKEN"))?;
                set_token(&mut doc, &base, "app_token", env_token(env, "SLACK_APP_TOKEN"))?;
                let allowed: BTreeSet<&str> =
                    channel_ids(handle).map(str::trim).filter(|id| !id.is_empty()).collect();
                if !allowed.is_empty() {
                    set(DRIVER, &mut doc, &format!("{base}.allowed_channels"), json!(allowed))?;
                }
            }
            _ => {}
        }
    }

    for command in &rc.configures {
        let (path, value) = parse_configure(command).ok_or_else(|| MaterializationError::Configure {
            driver: DRIVER,
            command: command.clone(),
        })?;
        set(DRIVER, &mut doc, path, value)?;
    }
    Ok(doc)
}

/// `microclaw config set <path> <value>` with the value typed as YAML.
/// A value that parses to null, or not at all, stays a string.
#[must_use]
pub fn parse_configure(command: &str) -> Option<(&str, Value)> {
    let (path, raw) = split_config_set(DRIVER, command)?;
    let value = match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Null) | Err(_) => Value::String(raw.to_string()),
        Ok(typed) => typed,
    };
    Some((path, value))
}

/// Encode `doc` as YAML.
///
/// # Errors
///
/// Returns `MaterializationError::EncodeYaml`.
pub fn render_yaml(doc: ConfigDoc) -> Result<String> {
    serde_yaml::to_string(&doc.into_value()).map_err(|source| MaterializationError::EncodeYaml {
        driver: DRIVER,
        what: "config",
        source,
    })
}

fn set_token(doc: &mut ConfigDoc, base: &str, key: &str, token: String) -> Result<()> {
    if token.is_empty() {
        return Ok(());
    }
    set(DRIVER, doc, &format!("{base}.{key}"), token)
}

fn set_username(doc: &mut ConfigDoc, base: &str, handle: &HandleInfo) -> Result<()> {
    if handle.username.trim().is_empty() {
        return Ok(());
    }
    set(DRIVER, doc, &format!("{base}.bot_username"), handle.username.as_str())
}

fn channel_ids(handle: &HandleInfo) -> impl Iterator<Item = &str> {
    handle
        .guilds
        .iter()
        .flat_map(|g| g.channels.iter().map(|c| c.id.as_str()))
}

/// Sorted, distinct, non-zero numeric IDs. Anything unparseable is dropped.
fn numeric_ids<'a, T>(ids: impl Iterator<Item = &'a str>) -> Vec<T>
where
    T: std::str::FromStr + Ord + Default,
{
    ids.filter_map(|id| id.trim().parse::<T>().ok())
        .filter(|id| *id != T::default())
        .collect::<BTreeSet<T>>()
        .into_iter()
        .collect()
}
