//! `claw up`: run the full pipeline for a pod.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::up::{UpDeps, UpOptions, up};
use crate::commands::PodFileArgs;
use crate::drivers::registry;
use crate::infra::fs::HostFs;

/// Arguments for the up command.
#[derive(Args)]
pub struct UpArgs {
    #[command(flatten)]
    pub pod: PodFileArgs,

    /// Start containers in the background and verify them
    #[arg(short, long)]
    pub detach: bool,
}

/// Run the up command.
///
/// # Errors
///
/// Returns the first per-service failure, or an engine failure.
pub async fn run(app: &AppContext, args: &UpArgs) -> Result<ExitCode> {
    let reporter = app.reporter();
    let deps = UpDeps {
        engine: &app.engine,
        registry: registry(),
        config: &app.config,
        reporter: &reporter,
        fs: &HostFs,
    };
    let opts = UpOptions {
        pod_file: args.pod.file.clone(),
        detach: args.detach,
        clawctl_addr: std::env::var("CLAWCTL_ADDR").ok(),
    };
    up(&deps, &opts).await?;
    Ok(ExitCode::SUCCESS)
}
