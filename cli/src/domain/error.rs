//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Clawfile errors ───────────────────────────────────────────────────────────

/// A malformed Clawfile. Every variant except `MissingClawType` cites a line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown Claw directive {directive}")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: duplicate {directive} directive")]
    Duplicate { line: usize, directive: String },

    #[error("line {line}: {directive} requires {expected}")]
    Arity {
        line: usize,
        directive: String,
        expected: &'static str,
    },

    #[error("line {line}: duplicate MODEL slot {slot:?}")]
    DuplicateModelSlot { line: usize, slot: String },

    #[error("line {line}: duplicate PRIVILEGE mode {mode:?}")]
    DuplicatePrivilege { line: usize, mode: String },

    #[error("line {line}: duplicate HANDLE platform {platform:?}")]
    DuplicateHandle { line: usize, platform: String },

    #[error("line {line}: {source}")]
    Surface { line: usize, source: SurfaceError },

    #[error("line {line}: INVOKE {source}")]
    Cron { line: usize, source: CronError },

    #[error("missing required CLAW_TYPE directive")]
    MissingClawType,
}

/// A surface URI that cannot be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("empty surface declaration")]
    Empty,

    #[error("surface URI {0:?} must have a scheme")]
    MissingScheme(String),

    #[error("surface URI {0:?} must have a target")]
    MissingTarget(String),

    #[error("SURFACE {scheme} does not support access mode")]
    AccessModeNotSupported { scheme: String },

    #[error("invalid access mode {mode:?} (allowed: read-only, read-write)")]
    InvalidAccessMode { mode: String },
}

/// A cron expression outside the 5-field grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression {expr:?} must have 5 fields, got {got}")]
    FieldCount { expr: String, got: usize },

    #[error("invalid {field} field {value:?}: {reason}")]
    Field {
        field: &'static str,
        value: String,
        reason: String,
    },
}

// ── Pod errors ────────────────────────────────────────────────────────────────

/// A malformed pod manifest.
#[derive(Debug, Error)]
pub enum PodParseError {
    #[error("parse pod YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pod YAML: {0}")]
    Shape(String),

    #[error("service {service:?}: {kind}")]
    Service { service: String, kind: ServiceFieldError },
}

/// The per-service detail of a `PodParseError`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceFieldError {
    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("handle {platform:?} is missing id")]
    HandleMissingId { platform: String },

    #[error("handle {platform:?}: guild entry {index} is missing id")]
    GuildMissingId { platform: String, index: usize },

    #[error("handle {platform:?}: guild {guild:?}: channel entry {index} is missing id")]
    ChannelMissingId {
        platform: String,
        guild: String,
        index: usize,
    },

    #[error("invoke entry {index} is missing {field}")]
    InvokeMissing { index: usize, field: &'static str },

    #[error("invoke entry {index}: {source}")]
    InvokeCron { index: usize, source: CronError },

    #[error("surface {uri:?}: map form is only supported for channel surfaces")]
    MapSurfaceNotChannel { uri: String },

    #[error("surface map entry must have exactly one key, got {0}")]
    MapSurfaceKeys(usize),

    #[error("surface: {0}")]
    Surface(#[from] SurfaceError),
}

// ── Resolution errors ─────────────────────────────────────────────────────────

/// Operator-supplied paths that cannot be resolved under the pod directory.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("contract enforcement: AGENT filename is empty (no contract, no start)")]
    EmptyContract,

    #[error("contract enforcement: agent file {path:?} escapes the pod directory (no contract, no start)")]
    ContractEscapes { path: String },

    #[error("contract enforcement: agent file {path:?} not found (no contract, no start)")]
    ContractNotFound { path: String },

    #[error("absolute contract path {path:?} is not supported; use a path relative to the pod root")]
    AbsoluteContract { path: String },

    #[error("skill path is empty")]
    EmptySkill,

    #[error("skill {path:?} escapes the pod directory")]
    SkillEscapes { path: String },

    #[error("skill {path:?} not found")]
    SkillNotFound { path: String },

    #[error("skill {path:?} is not a regular file")]
    SkillNotFile { path: String },

    #[error("duplicate skill name {name:?} (from {first:?} and {second:?})")]
    DuplicateSkill {
        name: String,
        first: String,
        second: String,
    },

    #[error("resolve {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Driver errors ─────────────────────────────────────────────────────────────

/// No driver is registered for a `claw.type`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown CLAW_TYPE {0:?}: no registered driver")]
pub struct DriverLookupError(pub String);

/// Driver pre-flight failures. Raised before any container starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{driver} driver: no agent host path specified (no contract, no start)")]
    MissingContract { driver: &'static str },

    #[error("{driver} driver: agent file {path:?} not found (no contract, no start)")]
    ContractNotFound { driver: &'static str, path: String },

    #[error("{driver} driver: HANDLE {platform} requires {var} in the service environment")]
    MissingTokenEnv {
        driver: &'static str,
        platform: String,
        var: &'static str,
    },

    #[error("{driver} driver: unsupported CONFIGURE command {command:?} (expected '{prefix} <path> <value>')")]
    UnsupportedConfigure {
        driver: &'static str,
        command: String,
        prefix: &'static str,
    },

    #[error("{driver} driver: {reason}")]
    Requirement { driver: &'static str, reason: String },
}

/// Failures while writing runtime artifacts.
#[derive(Debug, Error)]
pub enum MaterializationError {
    #[error("{driver} driver: write {path}: {source}")]
    Io {
        driver: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{driver} driver: {source}")]
    ConfigPath {
        driver: &'static str,
        #[source]
        source: ConfigPathError,
    },

    #[error("{driver} driver: unsupported CONFIGURE command {command:?}")]
    Configure { driver: &'static str, command: String },

    #[error("{driver} driver: encode {what}: {source}")]
    Encode {
        driver: &'static str,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{driver} driver: read {path}: {source}")]
    Read {
        driver: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{driver} driver: {reason}")]
    Requirement { driver: &'static str, reason: String },

    #[error("{driver} driver: encode {what} as YAML: {source}")]
    EncodeYaml {
        driver: &'static str,
        what: &'static str,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failures setting a dotted path inside a JSON config document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigPathError {
    #[error("config path is empty")]
    Empty,

    #[error("config path {path:?} has an empty segment")]
    EmptySegment { path: String },

    #[error("path conflict at {at:?} while setting {path:?}")]
    Conflict { path: String, at: String },
}

// ── Emission errors ───────────────────────────────────────────────────────────

/// Compose emission failures.
#[derive(Debug, Error)]
pub enum EmissionError {
    #[error("service {service:?}: unsupported surface scheme {scheme:?} in {uri:?}")]
    UnsupportedScheme {
        service: String,
        scheme: String,
        uri: String,
    },

    #[error("service {service:?}: surface {uri:?} does not support access mode {mode:?}")]
    AccessModeNotSupported {
        service: String,
        uri: String,
        mode: String,
    },

    #[error("service {service:?}: surface {uri:?} has unsupported access mode {mode:?}")]
    InvalidAccessMode {
        service: String,
        uri: String,
        mode: String,
    },

    #[error("service {service:?}: host surface {uri:?} must use an absolute host path")]
    HostPathNotAbsolute { service: String, uri: String },

    #[error("service {service:?}: surface {uri:?} is missing a target")]
    MissingTarget { service: String, uri: String },

    #[error("service {service:?}: service surface {uri:?} targets unknown service {target:?}")]
    UnknownServiceTarget {
        service: String,
        uri: String,
        target: String,
    },

    #[error("cllama proxy {field} must not be empty")]
    Proxy { field: &'static str },

    #[error("clawctl {field} must not be empty")]
    Clawctl { field: &'static str },

    #[error("emit compose: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ── Engine errors ─────────────────────────────────────────────────────────────

/// Container engine CLI failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{command} exited with status {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{command}: unexpected output: {reason}")]
    Decode { command: String, reason: String },

    #[error("no container found for service {0:?}")]
    NoContainer(String),
}

// ── Health errors ─────────────────────────────────────────────────────────────

/// A probe output that does not carry a JSON status object.
#[derive(Debug, Error)]
pub enum HealthParseError {
    #[error("health probe: no JSON object found in output")]
    NoJson,

    #[error("health probe: failed to parse JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// ── Scaffold errors ───────────────────────────────────────────────────────────

/// Rejected `agent add` input or an unusable pod file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaffoldError {
    #[error("{kind} name is required")]
    MissingName { kind: &'static str },

    #[error("{kind} name {name:?} is invalid (allowed: letters, digits, '-', '_' and must start with alphanumeric)")]
    InvalidName { kind: &'static str, name: String },

    #[error("invalid {what} {value:?} (allowed: {allowed})")]
    InvalidChoice {
        what: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("invalid volume spec {0:?} (expected <name> or <name>:<mode>)")]
    VolumeSpec(String),

    #[error("service {0:?} already exists in the pod file")]
    ServiceExists(String),

    #[error("{0} already exists; refusing to overwrite")]
    FileExists(String),

    #[error("invalid pod YAML: {0}")]
    PodShape(&'static str),
}
