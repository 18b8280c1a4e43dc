//! `claw-pod.yml` parsing.
//!
//! The manifest is read as an untyped YAML tree and interpreted field by
//! field: several `x-claw` fields accept more than one shape (scalar or map
//! handles, string or map surfaces), and each shape is normalised here so
//! that downstream code sees one form.

use std::collections::BTreeMap;

use claw_common::{
    ChannelConfig, ChannelDmConfig, ChannelGuildConfig, ChannelInfo, GuildInfo, HandleInfo,
    Invocation,
};
use serde_yaml::{Mapping, Value};

use super::{ClawBlock, Pod, Service};
use crate::domain::clawfile::cron::validate_cron;
use crate::domain::error::{PodParseError, ServiceFieldError};
use crate::domain::surface::{SCHEME_CHANNEL, Surface, parse_surface};

/// Largest `count` a claw service may declare.
pub const MAX_COUNT: u32 = 1024;

/// A handle entry before normalisation.
enum HandleRef {
    /// `discord: "123"` shorthand.
    Id(String),
    Full(HandleInfo),
}

impl HandleRef {
    fn into_info(self) -> HandleInfo {
        match self {
            Self::Id(id) => HandleInfo {
                id,
                ..HandleInfo::default()
            },
            Self::Full(info) => info,
        }
    }
}

/// A surface entry before normalisation.
enum SurfaceEntry {
    Uri(String),
    /// Single-key map form; only legal for `channel://`.
    Map { uri: String, config: ChannelConfig },
}

type FieldResult<T> = Result<T, ServiceFieldError>;

/// Parse a pod manifest.
///
/// # Errors
///
/// Returns `PodParseError` for malformed YAML and for any `x-claw` field
/// that cannot be interpreted (handles without id, invoke entries without
/// schedule or message, map-form surfaces on non-channel schemes, invalid
/// cron expressions).
pub fn parse_pod(src: &str) -> Result<Pod, PodParseError> {
    let doc: Value = serde_yaml::from_str(src)?;
    let root = match doc {
        Value::Null => return Ok(Pod::default()),
        Value::Mapping(m) => m,
        _ => return Err(PodParseError::Shape("document must be a mapping".into())),
    };

    let name = match root.get("x-claw") {
        Some(Value::Mapping(pod_claw)) => pod_claw
            .get("pod")
            .and_then(scalar_string)
            .unwrap_or_default(),
        Some(Value::Null) | None => String::new(),
        Some(_) => return Err(PodParseError::Shape("x-claw must be a mapping".into())),
    };

    let mut services = BTreeMap::new();
    match root.get("services") {
        Some(Value::Mapping(entries)) => {
            for (key, value) in entries {
                let service_name = scalar_string(key)
                    .ok_or_else(|| PodParseError::Shape("service names must be strings".into()))?;
                let service = parse_service(value).map_err(|kind| PodParseError::Service {
                    service: service_name.clone(),
                    kind,
                })?;
                services.insert(service_name, service);
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => return Err(PodParseError::Shape("services must be a mapping".into())),
    }

    Ok(Pod { name, services })
}

fn parse_service(value: &Value) -> FieldResult<Service> {
    let empty = Mapping::new();
    let map = match value {
        Value::Mapping(m) => m,
        Value::Null => &empty,
        _ => return Err(invalid("service", "must be a mapping")),
    };

    let claw = match map.get("x-claw") {
        Some(Value::Mapping(block)) => Some(parse_claw_block(block)?),
        Some(Value::Null) => Some(ClawBlock::default()),
        Some(_) => return Err(invalid("x-claw", "must be a mapping")),
        None => None,
    };

    Ok(Service {
        image: map.get("image").and_then(scalar_string).unwrap_or_default(),
        environment: parse_environment(map.get("environment"))?,
        expose: parse_expose(map.get("expose"))?,
        ports: parse_ports(map.get("ports"))?,
        claw,
    })
}

fn parse_claw_block(map: &Mapping) -> FieldResult<ClawBlock> {
    let count = match map.get("count") {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => match n.as_i64() {
            Some(c) if c < 1 => 1,
            Some(c) if c <= i64::from(MAX_COUNT) => u32::try_from(c).unwrap_or(MAX_COUNT),
            _ => return Err(invalid("count", format!("must be at most {MAX_COUNT}"))),
        },
        Some(_) => return Err(invalid("count", "must be an integer")),
    };

    let surfaces = match map.get("surfaces") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(parse_surface_entry)
            .map(|entry| entry.and_then(normalize_surface))
            .collect::<FieldResult<_>>()?,
        Some(_) => return Err(invalid("surfaces", "must be a list")),
    };

    let handles = match map.get("handles") {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Mapping(entries)) => {
            let mut out = BTreeMap::new();
            for (key, value) in entries {
                let platform = scalar_string(key)
                    .map(|p| p.trim().to_ascii_lowercase())
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| invalid("handles", "platform name must not be empty"))?;
                let info = parse_handle(&platform, value)?.into_info();
                out.insert(platform, info);
            }
            out
        }
        Some(_) => return Err(invalid("handles", "must be a mapping")),
    };

    Ok(ClawBlock {
        agent: optional_string(map, "agent")?,
        persona: optional_string(map, "persona")?,
        cllama: parse_string_or_list(map.get("cllama"), "cllama")?,
        cllama_env: parse_environment(map.get("cllama-env"))
            .map_err(|_| invalid("cllama-env", "must be a mapping of strings"))?,
        count,
        handles,
        surfaces,
        skills: parse_string_list(map.get("skills"), "skills")?,
        invoke: parse_invoke(map.get("invoke"))?,
    })
}

// ── Scalars ───────────────────────────────────────────────────────────────────

/// Render a YAML scalar as a string. Integers keep full precision.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ServiceFieldError {
    ServiceFieldError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn optional_string(map: &Mapping, key: &str) -> FieldResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_string(v)
            .map(Some)
            .ok_or_else(|| invalid(key, "must be a string")),
    }
}

fn parse_string_or_list(value: Option<&Value>, field: &str) -> FieldResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => {
            if s.trim().is_empty() {
                return Err(invalid(field, "string value must not be empty"));
            }
            Ok(vec![s.clone()])
        }
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
                Value::String(_) => Err(invalid(field, format!("list item {i} must not be empty"))),
                _ => Err(invalid(field, format!("list item {i} must be a string"))),
            })
            .collect(),
        Some(_) => Err(invalid(field, "expected string or list")),
    }
}

fn parse_string_list(value: Option<&Value>, field: &str) -> FieldResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                scalar_string(item).ok_or_else(|| invalid(field, format!("item {i} must be a string")))
            })
            .collect(),
        Some(_) => Err(invalid(field, "must be a list")),
    }
}

/// `environment` as a map or as a list of `KEY=VALUE` strings.
fn parse_environment(value: Option<&Value>) -> FieldResult<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(entries)) => {
            for (key, value) in entries {
                let key = scalar_string(key)
                    .ok_or_else(|| invalid("environment", "keys must be strings"))?;
                let value = match value {
                    Value::Null => String::new(),
                    v => scalar_string(v).ok_or_else(|| {
                        invalid("environment", format!("{key} must be a scalar"))
                    })?,
                };
                env.insert(key, value);
            }
        }
        Some(Value::Sequence(items)) => {
            for item in items {
                let entry = scalar_string(item)
                    .ok_or_else(|| invalid("environment", "list entries must be strings"))?;
                let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                env.insert(key.to_string(), value.to_string());
            }
        }
        Some(_) => return Err(invalid("environment", "must be a mapping or a list")),
    }
    Ok(env)
}

// ── Ports ─────────────────────────────────────────────────────────────────────

fn parse_expose(value: Option<&Value>) -> FieldResult<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                scalar_string(item)
                    .ok_or_else(|| invalid("expose", format!("entry {i}: unsupported value")))
            })
            .collect(),
        Some(_) => Err(invalid("expose", "must be a list")),
    }
}

fn parse_ports(value: Option<&Value>) -> FieldResult<Vec<String>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => return Err(invalid("ports", "must be a list")),
    };
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::String(s) => {
                let port = container_port(s);
                if !port.is_empty() {
                    out.push(port.to_string());
                }
            }
            Value::Number(n) => out.push(n.to_string()),
            Value::Mapping(m) => {
                if let Some(target) = m.get("target").and_then(scalar_string) {
                    if !target.is_empty() {
                        out.push(target);
                    }
                }
            }
            _ => return Err(invalid("ports", format!("entry {i}: unsupported value"))),
        }
    }
    Ok(out)
}

/// The container-side port of a compose `ports` string.
///
/// `8080:80`, `127.0.0.1:8080:80/tcp`, `80/udp` → `80`. The protocol suffix
/// is dropped; peers only need the bare port.
#[must_use]
pub fn container_port(spec: &str) -> &str {
    let spec = spec.rsplit_once('/').map_or(spec, |(port, _)| port);
    let spec = spec.rsplit_once(':').map_or(spec, |(_, port)| port);
    spec.trim()
}

// ── Handles ───────────────────────────────────────────────────────────────────

fn id_field(map: &Mapping) -> Option<String> {
    map.get("id").and_then(scalar_string).filter(|id| !id.is_empty())
}

fn parse_handle(platform: &str, value: &Value) -> FieldResult<HandleRef> {
    let missing = || ServiceFieldError::HandleMissingId {
        platform: platform.to_string(),
    };
    match value {
        Value::Mapping(map) => {
            let id = id_field(map).ok_or_else(missing)?;
            let username = match map.get("username") {
                None | Some(Value::Null) => String::new(),
                Some(v) => scalar_string(v)
                    .ok_or_else(|| invalid("handles", "username must be a string"))?,
            };
            let guilds = match map.get("guilds") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Sequence(items)) => items
                    .iter()
                    .enumerate()
                    .map(|(i, g)| parse_guild(platform, i, g))
                    .collect::<FieldResult<_>>()?,
                Some(_) => return Err(invalid("handles", "guilds must be a list")),
            };
            Ok(HandleRef::Full(HandleInfo {
                id,
                username,
                guilds,
            }))
        }
        Value::Null => Err(missing()),
        v => scalar_string(v)
            .filter(|id| !id.is_empty())
            .map(HandleRef::Id)
            .ok_or_else(missing),
    }
}

fn parse_guild(platform: &str, index: usize, value: &Value) -> FieldResult<GuildInfo> {
    let missing = || ServiceFieldError::GuildMissingId {
        platform: platform.to_string(),
        index,
    };
    let Value::Mapping(map) = value else {
        return Err(missing());
    };
    let id = id_field(map).ok_or_else(missing)?;
    let name = map.get("name").and_then(scalar_string).unwrap_or_default();
    let channels = match map.get("channels") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, c)| parse_channel(platform, &id, i, c))
            .collect::<FieldResult<_>>()?,
        Some(_) => return Err(invalid("handles", "guild channels must be a list")),
    };
    Ok(GuildInfo { id, name, channels })
}

fn parse_channel(platform: &str, guild: &str, index: usize, value: &Value) -> FieldResult<ChannelInfo> {
    let missing = || ServiceFieldError::ChannelMissingId {
        platform: platform.to_string(),
        guild: guild.to_string(),
        index,
    };
    match value {
        Value::Mapping(map) => Ok(ChannelInfo {
            id: id_field(map).ok_or_else(missing)?,
            name: map.get("name").and_then(scalar_string).unwrap_or_default(),
        }),
        v => scalar_string(v)
            .filter(|id| !id.is_empty())
            .map(|id| ChannelInfo {
                id,
                name: String::new(),
            })
            .ok_or_else(missing),
    }
}

// ── Surfaces ──────────────────────────────────────────────────────────────────

fn parse_surface_entry(value: &Value) -> FieldResult<SurfaceEntry> {
    match value {
        Value::String(s) => Ok(SurfaceEntry::Uri(s.clone())),
        Value::Mapping(map) => {
            if map.len() != 1 {
                return Err(ServiceFieldError::MapSurfaceKeys(map.len()));
            }
            let Some((key, config)) = map.iter().next() else {
                return Err(ServiceFieldError::MapSurfaceKeys(0));
            };
            let uri = scalar_string(key)
                .ok_or_else(|| invalid("surfaces", "map key must be a surface URI"))?;
            let surface = parse_surface(&uri)?;
            if surface.scheme != SCHEME_CHANNEL {
                return Err(ServiceFieldError::MapSurfaceNotChannel { uri });
            }
            Ok(SurfaceEntry::Map {
                uri,
                config: parse_channel_config(config)?,
            })
        }
        _ => Err(invalid("surfaces", "entries must be a string or a single-key map")),
    }
}

fn normalize_surface(entry: SurfaceEntry) -> FieldResult<Surface> {
    match entry {
        SurfaceEntry::Uri(raw) => Ok(parse_surface(&raw)?),
        SurfaceEntry::Map { uri, config } => {
            let mut surface = parse_surface(&uri)?;
            surface.channel_config = Some(config);
            Ok(surface)
        }
    }
}

fn bool_field(map: &Mapping, key: &str) -> FieldResult<bool> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid("surfaces", format!("{key} must be a boolean"))),
    }
}

fn id_list(map: &Mapping, key: &str) -> FieldResult<Vec<String>> {
    parse_string_list(map.get(key), "surfaces")
        .map_err(|_| invalid("surfaces", format!("{key} must be a list of IDs")))
}

fn parse_channel_config(value: &Value) -> FieldResult<ChannelConfig> {
    let map = match value {
        Value::Null => return Ok(ChannelConfig::default()),
        Value::Mapping(m) => m,
        _ => return Err(invalid("surfaces", "channel config must be a mapping")),
    };

    let dm = match map.get("dm") {
        None | Some(Value::Null) => ChannelDmConfig::default(),
        Some(Value::Mapping(dm)) => ChannelDmConfig {
            enabled: bool_field(dm, "enabled")?,
            policy: dm.get("policy").and_then(scalar_string).unwrap_or_default(),
            allow_from: id_list(dm, "allow_from")?,
        },
        Some(_) => return Err(invalid("surfaces", "dm must be a mapping")),
    };

    let mut guilds = BTreeMap::new();
    match map.get("guilds") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(entries)) => {
            for (key, value) in entries {
                let guild_id = scalar_string(key)
                    .ok_or_else(|| invalid("surfaces", "guild keys must be IDs"))?;
                let guild = match value {
                    Value::Null => ChannelGuildConfig::default(),
                    Value::Mapping(g) => ChannelGuildConfig {
                        policy: g.get("policy").and_then(scalar_string).unwrap_or_default(),
                        require_mention: bool_field(g, "require_mention")?,
                        users: id_list(g, "users")?,
                    },
                    _ => return Err(invalid("surfaces", "guild config must be a mapping")),
                };
                guilds.insert(guild_id, guild);
            }
        }
        Some(_) => return Err(invalid("surfaces", "guilds must be a mapping")),
    }

    Ok(ChannelConfig { dm, guilds })
}

// ── Invocations ───────────────────────────────────────────────────────────────

fn parse_invoke(value: Option<&Value>) -> FieldResult<Vec<Invocation>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => return Err(invalid("invoke", "must be a list")),
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Mapping(map) = item else {
            return Err(invalid("invoke", format!("entry {index} must be a mapping")));
        };
        let field = |key: &str| {
            map.get(key)
                .and_then(scalar_string)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let schedule = field("schedule");
        if schedule.is_empty() {
            return Err(ServiceFieldError::InvokeMissing {
                index,
                field: "schedule",
            });
        }
        let message = field("message");
        if message.is_empty() {
            return Err(ServiceFieldError::InvokeMissing {
                index,
                field: "message",
            });
        }
        validate_cron(&schedule).map_err(|source| ServiceFieldError::InvokeCron { index, source })?;
        out.push(Invocation {
            schedule,
            message,
            to: field("to"),
            name: field("name"),
        });
    }
    Ok(out)
}
