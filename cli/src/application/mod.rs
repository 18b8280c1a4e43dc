//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends on `crate::domain`, `crate::runtime` and
//! `crate::drivers`, never on `crate::infra`, `crate::commands`, or
//! `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    CommandRunner, ConfigStore, ContainerDetails, ContainerEngine, ExecOutput, LocalFs,
    ProgressReporter,
};
