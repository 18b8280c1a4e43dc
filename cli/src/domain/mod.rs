//! Domain layer: pure pipeline logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod clawfile;
pub mod config;
pub mod config_doc;
pub mod error;
pub mod health;
pub mod inspect;
pub mod manifest;
pub mod markdown;
pub mod pod;
pub mod resolved;
pub mod scaffold;
pub mod surface;

pub use config::ClawdapusConfig;
pub use error::{
    DriverLookupError, EmissionError, EngineError, MaterializationError, ParseError,
    PodParseError, ResolutionError, ScaffoldError, ValidationError,
};
pub use health::{Health, collect_issues};
pub use inspect::ClawInfo;
pub use resolved::{MaterializeOpts, MaterializeResult, ResolvedClaw, ResolvedSkill};
