//! Command implementations, one module per CLI verb.

pub mod agent;
pub mod build;
pub mod doctor;
pub mod health;
pub mod inspect;
pub mod lifecycle;
pub mod up;

use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus};

use clap::Args;

/// Pod file selection shared by the pod verbs.
#[derive(Args, Debug, Clone)]
pub struct PodFileArgs {
    /// Pod file
    #[arg(short = 'f', long = "file", default_value = "claw-pod.yml")]
    pub file: PathBuf,
}

/// Pass an engine exit status through as the process exit code.
#[must_use]
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}
