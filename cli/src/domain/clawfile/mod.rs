//! The Clawfile dialect: a container-build file extended with claw directives.

pub mod cron;
pub mod emit;
pub mod parser;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::surface::Surface;

pub use emit::{emit, labels};
pub use parser::{Instruction, ParseResult, parse};

/// Typed claw directives extracted from a Clawfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClawConfig {
    pub claw_type: String,
    pub agent: Option<String>,
    /// Slot → `provider/model`
    pub models: BTreeMap<String, String>,
    pub cllama: Option<String>,
    pub persona: Option<String>,
    pub surfaces: Vec<SurfaceDecl>,
    pub skills: Vec<String>,
    pub invocations: Vec<ScheduledCommand>,
    /// Mode → user spec
    pub privileges: BTreeMap<String, String>,
    pub configures: Vec<String>,
    /// Lowercased platform tags in declared order
    pub handles: Vec<String>,
    pub tracks: Vec<String>,
}

/// A SURFACE directive: the raw text (persisted as a label) and its parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceDecl {
    pub raw: String,
    pub surface: Surface,
}

/// An INVOKE directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduledCommand {
    pub schedule: String,
    pub command: String,
}

/// Split `n` whitespace-delimited fields off the front of `s`, returning the
/// fields and the untouched remainder.
pub(crate) fn split_leading_fields(s: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = s.trim_start();
    let mut fields = Vec::with_capacity(n);
    for _ in 0..n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest))
}
