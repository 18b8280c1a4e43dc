//! Render a parsed Clawfile as a plain container-build file with `claw.*`
//! labels.
//!
//! The output is a pure function of the [`ParseResult`]: no timestamps, and
//! every map is walked in sorted order. Scheduled invocations are stored as
//! labels only; no cron file is written into the image.

use std::fmt::Write as _;

use claw_common::labels::{image, indexed};

use super::{ClawConfig, ParseResult};

/// Claw labels for `config`, in emission order.
#[must_use]
pub fn labels(config: &ClawConfig) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut push = |key: String, value: &str| out.push((key, value.to_string()));

    push(image::TYPE.to_string(), &config.claw_type);
    if let Some(agent) = &config.agent {
        push(image::AGENT_FILE.to_string(), agent);
    }
    if let Some(cllama) = &config.cllama {
        push(image::CLLAMA_DEFAULT.to_string(), cllama);
    }
    if let Some(persona) = &config.persona {
        push(image::PERSONA_DEFAULT.to_string(), persona);
    }
    for (slot, model) in &config.models {
        push(format!("{}{slot}", image::MODEL), model);
    }
    for (i, decl) in config.surfaces.iter().enumerate() {
        push(indexed(image::SURFACE, i), &decl.raw);
    }
    let mut handles: Vec<&String> = config.handles.iter().collect();
    handles.sort();
    for platform in handles {
        push(format!("{}{platform}", image::HANDLE), "true");
    }
    for (i, skill) in config.skills.iter().enumerate() {
        push(indexed(image::SKILL, i), skill);
    }
    for (mode, user) in &config.privileges {
        push(format!("{}{mode}", image::PRIVILEGE), user);
    }
    for (i, track) in config.tracks.iter().enumerate() {
        push(indexed(image::TRACK, i), track);
    }
    for (i, cmd) in config.configures.iter().enumerate() {
        push(indexed(image::CONFIGURE, i), cmd);
    }
    for (i, inv) in config.invocations.iter().enumerate() {
        push(
            indexed(image::INVOKE, i),
            &format!("{}\t{}", inv.schedule, inv.command),
        );
    }
    out
}

/// Render the container-build file.
///
/// Parser directives come first, then every build instruction verbatim. The
/// label block follows the last `FROM` so it lands on the final stage; with
/// no `FROM` it is appended at the end.
#[must_use]
pub fn emit(result: &ParseResult) -> String {
    let mut out = String::new();
    for directive in &result.parser_directives {
        out.push_str(directive);
        out.push('\n');
    }

    let label_block: String = labels(&result.config)
        .iter()
        .fold(String::new(), |mut acc, (key, value)| {
            let _ = writeln!(acc, "LABEL {key}=\"{}\"", escape_label(value));
            acc
        });

    let last_from = result
        .build_nodes
        .iter()
        .rposition(|n| n.keyword.eq_ignore_ascii_case("FROM"));

    for (i, node) in result.build_nodes.iter().enumerate() {
        out.push_str(node.original.trim_end_matches('\n'));
        out.push('\n');
        if Some(i) == last_from {
            out.push('\n');
            out.push_str(&label_block);
        }
    }
    if last_from.is_none() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&label_block);
    }
    out
}

/// Escape a value for a double-quoted LABEL argument.
fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
