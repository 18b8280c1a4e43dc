//! `claw down`, `claw ps`, `claw logs`: engine compose on the generated file.
//!
//! Exit codes pass through from the engine.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::lifecycle;
use crate::commands::{PodFileArgs, exit_code};

/// Arguments for the logs command.
#[derive(Args)]
pub struct LogsArgs {
    #[command(flatten)]
    pub pod: PodFileArgs,

    /// Follow log output
    #[arg(long)]
    pub follow: bool,

    /// Limit to these services
    pub services: Vec<String>,
}

/// # Errors
///
/// Returns an error when `claw up` has not run or the engine cannot start.
pub async fn down(app: &AppContext, args: &PodFileArgs) -> Result<ExitCode> {
    Ok(exit_code(lifecycle::down(&app.engine, &args.file).await?))
}

/// # Errors
///
/// Returns an error when `claw up` has not run or the engine cannot start.
pub async fn ps(app: &AppContext, args: &PodFileArgs) -> Result<ExitCode> {
    Ok(exit_code(lifecycle::ps(&app.engine, &args.file).await?))
}

/// # Errors
///
/// Returns an error when `claw up` has not run or the engine cannot start.
pub async fn logs(app: &AppContext, args: &LogsArgs) -> Result<ExitCode> {
    let status = lifecycle::logs(&app.engine, &args.pod.file, args.follow, &args.services).await?;
    Ok(exit_code(status))
}
