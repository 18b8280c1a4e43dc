//! `claw agent add`: plan a new agent and splice it into an existing pod
//! file without disturbing the rest of the document.
//!
//! Pod edits are line-level so comments, key order and formatting of
//! untouched sections survive verbatim.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use claw_common::{GuildInfo, HandleInfo};
use regex::Regex;

use crate::domain::error::ScaffoldError;
use crate::domain::pod::Pod;
use crate::domain::surface::{ACCESS_READ_ONLY, ACCESS_READ_WRITE};

pub const DEFAULT_CLAW_TYPE: &str = "openclaw";
pub const DEFAULT_MODEL: &str = "openrouter/anthropic/claude-sonnet-4";
pub const DEFAULT_PLATFORM: Platform = Platform::Discord;
pub const DEFAULT_CLLAMA: &str = "passthrough";
const FALLBACK_POD_NAME: &str = "my-project";

/// Claw types `agent add` can scaffold.
pub const SCAFFOLD_TYPES: &[&str] = &["openclaw", "nullclaw", "nanoclaw"];

pub const DEFAULT_AGENT_CONTRACT: &str = "# Agent Contract

You are a helpful assistant. Follow these rules:

1. Be concise and direct
2. Stay on topic
3. Ask for clarification when instructions are ambiguous
";

#[allow(clippy::expect_used)]
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").expect("valid regex"));

/// Chat platform a scaffolded agent gets a handle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Discord,
    Slack,
    Telegram,
    None,
}

impl Platform {
    pub fn parse(value: &str) -> Result<Self, ScaffoldError> {
        match value.trim().to_lowercase().as_str() {
            "discord" => Ok(Self::Discord),
            "slack" => Ok(Self::Slack),
            "telegram" => Ok(Self::Telegram),
            "none" => Ok(Self::None),
            _ => Err(ScaffoldError::InvalidChoice {
                what: "platform",
                value: value.to_string(),
                allowed: "discord, slack, telegram, none",
            }),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Slack => "slack",
            Self::Telegram => "telegram",
            Self::None => "none",
        }
    }

    /// Env var carrying the bot token, e.g. `DISCORD_BOT_TOKEN`.
    #[must_use]
    pub fn token_key(self) -> Option<&'static str> {
        match self {
            Self::Discord => Some("DISCORD_BOT_TOKEN"),
            Self::Slack => Some("SLACK_BOT_TOKEN"),
            Self::Telegram => Some("TELEGRAM_BOT_TOKEN"),
            Self::None => None,
        }
    }

    #[must_use]
    pub fn id_key(self) -> Option<&'static str> {
        match self {
            Self::Discord => Some("DISCORD_BOT_ID"),
            Self::Slack => Some("SLACK_BOT_ID"),
            Self::Telegram => Some("TELEGRAM_BOT_ID"),
            Self::None => None,
        }
    }
}

/// `--cllama` answer before it is resolved against the pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CllamaChoice {
    Enable,
    Disable,
    Inherit,
}

impl CllamaChoice {
    pub fn parse(value: &str) -> Result<Self, ScaffoldError> {
        match value.trim().to_lowercase().as_str() {
            "yes" | "true" | "1" | DEFAULT_CLLAMA => Ok(Self::Enable),
            "no" | "none" | "false" | "0" => Ok(Self::Disable),
            "inherit" => Ok(Self::Inherit),
            _ => Err(ScaffoldError::InvalidChoice {
                what: "cllama choice",
                value: value.to_string(),
                allowed: "yes, no, inherit, passthrough",
            }),
        }
    }
}

pub fn validate_entity_name(kind: &'static str, name: &str) -> Result<(), ScaffoldError> {
    if name.trim().is_empty() {
        return Err(ScaffoldError::MissingName { kind });
    }
    if !NAME_RE.is_match(name) {
        return Err(ScaffoldError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn parse_claw_type(value: &str) -> Result<String, ScaffoldError> {
    let v = value.trim().to_lowercase();
    if SCAFFOLD_TYPES.contains(&v.as_str()) {
        return Ok(v);
    }
    Err(ScaffoldError::InvalidChoice {
        what: "claw type",
        value: value.to_string(),
        allowed: "openclaw, nullclaw, nanoclaw",
    })
}

/// `name` or `name:mode`; mode defaults to read-write.
pub fn parse_volume_spec(spec: &str) -> Result<(String, String), ScaffoldError> {
    let raw = spec.trim();
    let bad = || ScaffoldError::VolumeSpec(spec.to_string());
    let (name, mode) = match raw.split(':').collect::<Vec<_>>().as_slice() {
        [name] => (name.trim(), ACCESS_READ_WRITE),
        [name, mode] => (name.trim(), mode.trim()),
        _ => return Err(bad()),
    };
    if name.is_empty() || !NAME_RE.is_match(name) {
        return Err(bad());
    }
    if mode != ACCESS_READ_ONLY && mode != ACCESS_READ_WRITE {
        return Err(ScaffoldError::InvalidChoice {
            what: "volume mode",
            value: mode.to_string(),
            allowed: "read-only, read-write",
        });
    }
    Ok((name.to_string(), mode.to_string()))
}

/// Upper-snake prefix for per-agent env vars: `crypto-bot` → `CRYPTO_BOT`.
#[must_use]
pub fn env_prefix(name: &str) -> String {
    let mut out = String::new();
    let mut last_underscore = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_uppercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "AGENT".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Relative contract paths always start with `./`.
#[must_use]
pub fn normalize_contract_path(path: &str) -> String {
    let p = path.trim().replace('\\', "/");
    if p.is_empty() || p.starts_with("./") {
        p
    } else {
        format!("./{p}")
    }
}

/// What an existing pod already settles for a new agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodContext {
    pub pod_name: String,
    /// First proxy type found among existing claw services.
    pub cllama: Option<String>,
    pub cllama_env: BTreeMap<String, String>,
    pub preferred_platform: Option<Platform>,
    /// Username and guilds copied onto the new agent's handle.
    pub handle_template: Option<HandleInfo>,
    pub existing_contracts: Vec<String>,
}

impl PodContext {
    /// Derive defaults from a parsed pod; `dir_name` names the pod when
    /// `x-claw.pod` is unset.
    #[must_use]
    pub fn from_pod(pod: &Pod, dir_name: &str) -> Self {
        let mut ctx = Self {
            pod_name: pod.name.trim().to_string(),
            ..Self::default()
        };
        for svc in pod.services.values() {
            let Some(claw) = &svc.claw else { continue };
            if let Some(agent) = &claw.agent {
                ctx.existing_contracts.push(normalize_contract_path(agent));
            }
            if ctx.cllama.is_none() {
                if let Some(first) = claw.cllama.first() {
                    ctx.cllama = Some(first.trim().to_string());
                    ctx.cllama_env.clone_from(&claw.cllama_env);
                }
            }
            if ctx.preferred_platform.is_none() {
                if let Some((platform, info)) = claw.handles.iter().next() {
                    if let Ok(p) = Platform::parse(platform) {
                        ctx.preferred_platform = Some(p);
                        ctx.handle_template = Some(HandleInfo {
                            id: String::new(),
                            username: info.username.clone(),
                            guilds: info
                                .guilds
                                .iter()
                                .map(|g| GuildInfo {
                                    id: g.id.clone(),
                                    name: g.name.clone(),
                                    channels: Vec::new(),
                                })
                                .collect(),
                        });
                    }
                }
            }
        }
        ctx.existing_contracts.sort();
        ctx.existing_contracts.dedup();

        if ctx.pod_name.is_empty() {
            ctx.pod_name = match dir_name.trim() {
                "" | "." | "/" => FALLBACK_POD_NAME.to_string(),
                name => name.to_string(),
            };
        }
        if ctx.cllama.is_some() && ctx.cllama_env.is_empty() {
            ctx.cllama_env
                .insert("OPENROUTER_API_KEY".into(), "${OPENROUTER_API_KEY}".into());
        }
        ctx
    }
}

/// Flags of one `agent add` invocation; `None` takes the pod-derived default.
#[derive(Debug, Clone, Default)]
pub struct AgentRequest {
    pub name: String,
    pub claw_type: Option<String>,
    pub model: Option<String>,
    pub cllama: Option<String>,
    pub platform: Option<String>,
    /// Reuse an existing contract, relative to the pod root.
    pub contract: Option<String>,
    pub volumes: Vec<String>,
    /// Copy this existing contract into a shared one and rewire its users.
    pub rewire_from: Option<String>,
    pub shared: Option<String>,
}

/// A fully resolved `agent add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPlan {
    pub name: String,
    pub claw_type: String,
    pub model: String,
    /// Empty when no proxy is used.
    pub cllama: String,
    pub cllama_env: BTreeMap<String, String>,
    pub platform: Platform,
    pub handle_template: Option<HandleInfo>,
    pub contract_path: String,
    pub create_agent_file: bool,
    /// `(source, target)` when a shared contract is created.
    pub shared: Option<(String, String)>,
    pub volumes: BTreeMap<String, String>,
    pub env_example_vars: Vec<String>,
    pub image: String,
    pub build_context: String,
}

impl AgentPlan {
    #[must_use]
    pub fn agent_dir(&self) -> String {
        format!("agents/{}", self.name)
    }
}

pub fn plan_agent(ctx: &PodContext, req: &AgentRequest) -> Result<AgentPlan, ScaffoldError> {
    let name = req.name.trim().to_string();
    validate_entity_name("agent", &name)?;

    let claw_type = parse_claw_type(req.claw_type.as_deref().unwrap_or(DEFAULT_CLAW_TYPE))?;
    let model = req
        .model
        .as_deref()
        .map_or(DEFAULT_MODEL, str::trim)
        .to_string();
    if model.is_empty() {
        return Err(ScaffoldError::MissingName { kind: "model" });
    }

    let platform = match &req.platform {
        Some(p) => Platform::parse(p)?,
        None => ctx.preferred_platform.unwrap_or(DEFAULT_PLATFORM),
    };

    let choice = match &req.cllama {
        Some(c) => CllamaChoice::parse(c)?,
        None if ctx.cllama.is_some() => CllamaChoice::Inherit,
        None => CllamaChoice::Disable,
    };
    let cllama = match choice {
        CllamaChoice::Enable => DEFAULT_CLLAMA.to_string(),
        CllamaChoice::Disable => String::new(),
        CllamaChoice::Inherit => ctx.cllama.clone().unwrap_or_default(),
    };
    let mut cllama_env = BTreeMap::new();
    if !cllama.is_empty() {
        cllama_env.clone_from(&ctx.cllama_env);
        if cllama_env.is_empty() {
            cllama_env.insert("OPENROUTER_API_KEY".into(), "${OPENROUTER_API_KEY}".into());
        }
    }

    let own_contract = normalize_contract_path(&format!("agents/{name}/AGENTS.md"));
    let (contract_path, create_agent_file, shared) = match (&req.shared, &req.rewire_from) {
        (Some(target), Some(source)) => {
            let target = normalize_contract_path(target);
            (target.clone(), false, Some((normalize_contract_path(source), target)))
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ScaffoldError::InvalidChoice {
                what: "shared contract flags",
                value: "--shared/--rewire-from".into(),
                allowed: "both --rewire-from and --shared together",
            });
        }
        (None, None) => match req.contract.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => (normalize_contract_path(c), false, None),
            _ => (own_contract, true, None),
        },
    };

    let mut volumes = BTreeMap::new();
    for spec in &req.volumes {
        if spec.trim().is_empty() {
            continue;
        }
        let (vol, mode) = parse_volume_spec(spec)?;
        volumes.insert(vol, mode);
    }

    let mut env_example_vars = Vec::new();
    if let (Some(token), Some(id)) = (platform.token_key(), platform.id_key()) {
        let prefix = env_prefix(&name);
        env_example_vars.push(format!("{prefix}_{id}"));
        env_example_vars.push(format!("{prefix}_{token}"));
    }

    Ok(AgentPlan {
        image: format!("{}-{name}:latest", ctx.pod_name),
        build_context: normalize_contract_path(&format!("agents/{name}")),
        name,
        claw_type,
        model,
        cllama,
        cllama_env,
        platform,
        handle_template: ctx.handle_template.clone(),
        contract_path,
        create_agent_file,
        shared,
        volumes,
        env_example_vars,
    })
}

/// Human-readable change list printed before anything is written.
#[must_use]
pub fn planned_changes(plan: &AgentPlan, pod_file: &str, rewired: usize) -> Vec<String> {
    let dir = plan.agent_dir();
    let mut out = vec![format!("+ create {dir}/Clawfile")];
    if plan.create_agent_file {
        out.push(format!("+ create {dir}/AGENTS.md"));
    }
    out.push(format!("+ create {dir}/skills/"));
    if let Some((_, target)) = &plan.shared {
        out.push(format!("+ create {}", target.trim_start_matches("./")));
    }
    out.push(format!("~ update {pod_file} (add service {})", plan.name));
    if rewired > 0 {
        if let Some((_, target)) = &plan.shared {
            out.push(format!(
                "~ rewire {rewired} existing service contract(s) to {}",
                target.trim_start_matches("./")
            ));
        }
    }
    if !plan.env_example_vars.is_empty() {
        out.push(format!(
            "~ update .env.example (append {})",
            plan.env_example_vars.join(", ")
        ));
    }
    out
}

#[must_use]
pub fn render_clawfile(plan: &AgentPlan) -> String {
    let mut b = String::new();
    let _ = writeln!(b, "FROM {}:latest\n", plan.claw_type);
    let _ = writeln!(b, "CLAW_TYPE {}", plan.claw_type);
    b.push_str("AGENT AGENTS.md\n\n");
    let _ = writeln!(b, "MODEL primary {}", plan.model);
    if !plan.cllama.is_empty() {
        let _ = writeln!(b, "\nCLLAMA {}", plan.cllama);
    }
    if plan.platform != Platform::None {
        let _ = writeln!(b, "\nHANDLE {}", plan.platform.as_str());
    }
    if plan.claw_type == "nanoclaw" {
        b.push_str("\nPRIVILEGE docker-socket true\n");
    }
    b
}

/// The `services.<name>` block, indented for a two-space pod file.
#[must_use]
pub fn render_service(plan: &AgentPlan) -> String {
    let mut b = String::new();
    let _ = writeln!(b, "{}:", plan.name);
    let _ = writeln!(b, "  image: {}", yaml_scalar(&plan.image));
    b.push_str("  build:\n");
    let _ = writeln!(b, "    context: {}", yaml_scalar(&plan.build_context));
    b.push_str("  x-claw:\n");
    let _ = writeln!(b, "    agent: {}", yaml_scalar(&plan.contract_path));
    if !plan.cllama.is_empty() {
        let _ = writeln!(b, "    cllama: {}", yaml_scalar(&plan.cllama));
        b.push_str("    cllama-env:\n");
        for (k, v) in &plan.cllama_env {
            let _ = writeln!(b, "      {k}: {}", yaml_scalar(v));
        }
    }

    let prefix = env_prefix(&plan.name);
    let keys = plan.platform.token_key().zip(plan.platform.id_key());
    if let Some((_, id_key)) = keys {
        b.push_str("    handles:\n");
        let _ = writeln!(b, "      {}:", plan.platform.as_str());
        let _ = writeln!(b, "        id: {}", yaml_scalar(&format!("${{{prefix}_{id_key}}}")));
        let _ = writeln!(b, "        username: {}", yaml_scalar(&plan.name));
        let mut guilds: Vec<(String, String)> = plan
            .handle_template
            .iter()
            .flat_map(|t| t.guilds.iter().map(|g| (g.id.clone(), g.name.clone())))
            .collect();
        if guilds.is_empty() && plan.platform == Platform::Discord {
            guilds.push(("${DISCORD_GUILD_ID}".into(), String::new()));
        }
        if !guilds.is_empty() {
            b.push_str("        guilds:\n");
            for (id, name) in guilds {
                let _ = writeln!(b, "          - id: {}", yaml_scalar(&id));
                if !name.is_empty() {
                    let _ = writeln!(b, "            name: {}", yaml_scalar(&name));
                }
            }
        }
    }
    if !plan.volumes.is_empty() {
        b.push_str("    surfaces:\n");
        for (name, mode) in &plan.volumes {
            let _ = writeln!(b, "      - {}", yaml_scalar(&format!("volume://{name} {mode}")));
        }
    }
    if let Some((token_key, _)) = keys {
        b.push_str("  environment:\n");
        let _ = writeln!(
            b,
            "    {token_key}: {}",
            yaml_scalar(&format!("${{{prefix}_{token_key}}}"))
        );
    }
    b
}

/// Plain scalar when YAML reads it back unchanged, double-quoted otherwise.
fn yaml_scalar(value: &str) -> String {
    const LEADING: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];
    let ambiguous = matches!(
        value.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
    );
    let needs_quotes = value.is_empty()
        || ambiguous
        || value.starts_with(LEADING)
        || value.starts_with(' ')
        || value.ends_with(' ')
        || value.contains(": ")
        || value.contains(" #")
        || value.parse::<f64>().is_ok();
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Key of a column-0 mapping entry.
fn top_level_key(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    Some(key.trim().trim_matches(|c| c == '"' || c == '\''))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_content(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && !t.starts_with('#')
}

/// Extent of a top-level block: header index, insertion point after its
/// last content line, and the indent of its direct children.
struct Block {
    header: usize,
    insert_at: usize,
    child_indent: usize,
    children: Vec<String>,
}

fn find_block(lines: &[String], key: &str) -> Option<Block> {
    let header = lines.iter().position(|l| top_level_key(l) == Some(key))?;
    let end = (header + 1..lines.len())
        .find(|&i| {
            let l = &lines[i];
            !l.trim().is_empty() && !l.starts_with(char::is_whitespace) && !l.starts_with('#')
        })
        .unwrap_or(lines.len());
    let mut insert_at = end;
    while insert_at > header + 1 && !is_content(&lines[insert_at - 1]) {
        insert_at -= 1;
    }
    let child_indent = lines[header + 1..end]
        .iter()
        .find(|l| is_content(l))
        .map_or(2, |l| indent_of(l));
    let children = lines[header + 1..end]
        .iter()
        .filter(|l| is_content(l) && indent_of(l) == child_indent)
        .filter_map(|l| l.trim().split_once(':').map(|(k, _)| k.trim().trim_matches('"').to_string()))
        .collect();
    Some(Block {
        header,
        insert_at,
        child_indent,
        children,
    })
}

/// Clear an inline `{}` on a block header so children can follow it.
fn open_block_header(lines: &mut [String], block: &Block, key: &'static str) -> Result<(), ScaffoldError> {
    let header = &lines[block.header];
    let rest = header.split_once(':').map_or("", |(_, r)| r);
    let value = rest.split(" #").next().unwrap_or("").trim().to_string();
    match value.as_str() {
        "" => Ok(()),
        "{}" | "null" | "~" => {
            lines[block.header] = format!("{key}:");
            Ok(())
        }
        _ => Err(ScaffoldError::PodShape("top-level block must be a mapping")),
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.replace("\r\n", "\n").lines().map(str::to_string).collect()
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Splice a rendered service block into `services:`.
pub fn insert_service(pod_yaml: &str, name: &str, block: &str) -> Result<String, ScaffoldError> {
    let mut lines = split_lines(pod_yaml);
    let Some(found) = find_block(&lines, "services") else {
        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push("services:".into());
        lines.extend(block.lines().map(|l| format!("  {l}")));
        return Ok(join_lines(&lines));
    };
    if found.children.iter().any(|c| c == name) {
        return Err(ScaffoldError::ServiceExists(name.to_string()));
    }
    open_block_header(&mut lines, &found, "services")?;
    let pad = " ".repeat(found.child_indent);
    let mut insert: Vec<String> = Vec::new();
    if found.insert_at > found.header + 1 {
        insert.push(String::new());
    }
    insert.extend(block.lines().map(|l| format!("{pad}{l}")));
    lines.splice(found.insert_at..found.insert_at, insert);
    Ok(join_lines(&lines))
}

/// Declare any of `names` missing from top-level `volumes:`.
pub fn ensure_volumes<'a>(
    pod_yaml: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<String, ScaffoldError> {
    let mut lines = split_lines(pod_yaml);
    let names: Vec<&String> = names.into_iter().collect();
    if names.is_empty() {
        return Ok(pod_yaml.to_string());
    }
    let Some(found) = find_block(&lines, "volumes") else {
        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push("volumes:".into());
        lines.extend(names.iter().map(|n| format!("  {n}: {{}}")));
        return Ok(join_lines(&lines));
    };
    open_block_header(&mut lines, &found, "volumes")?;
    let pad = " ".repeat(found.child_indent);
    let missing: Vec<String> = names
        .iter()
        .filter(|n| !found.children.iter().any(|c| c.as_str() == n.as_str()))
        .map(|n| format!("{pad}{n}: {{}}"))
        .collect();
    lines.splice(found.insert_at..found.insert_at, missing);
    Ok(join_lines(&lines))
}

/// Point every nested `agent:` equal to `from` at `to`.
#[must_use]
pub fn rewire_contracts(pod_yaml: &str, from: &str, to: &str) -> (String, usize) {
    let from = normalize_contract_path(from);
    let to = normalize_contract_path(to);
    let mut count = 0;
    let lines: Vec<String> = split_lines(pod_yaml)
        .into_iter()
        .map(|line| {
            let indent = indent_of(&line);
            let Some(rest) = line.trim_start().strip_prefix("agent:") else {
                return line;
            };
            if indent == 0 {
                return line;
            }
            let value = rest.split(" #").next().unwrap_or("").trim();
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            if normalize_contract_path(value) != from {
                return line;
            }
            count += 1;
            format!("{}agent: {to}", " ".repeat(indent))
        })
        .collect();
    (join_lines(&lines), count)
}

/// Append `KEY=` for every var not already present; returns the new content
/// and the keys added.
#[must_use]
pub fn append_env_example(content: &str, vars: &[String]) -> (String, Vec<String>) {
    let mut lines = split_lines(content);
    let mut existing: Vec<String> = lines
        .iter()
        .filter_map(|l| {
            let s = l.trim();
            if s.starts_with('#') {
                return None;
            }
            s.split_once('=')
                .map(|(k, _)| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
        .collect();
    let mut added = Vec::new();
    for key in vars {
        if existing.contains(key) {
            continue;
        }
        lines.push(format!("{key}="));
        existing.push(key.clone());
        added.push(key.clone());
    }
    if added.is_empty() {
        return (content.to_string(), added);
    }
    (join_lines(&lines), added)
}
