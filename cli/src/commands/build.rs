//! `claw build`: Clawfile to Dockerfile.generated to image.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::build::build_image;
use crate::infra::fs::HostFs;

/// Arguments for the build command.
#[derive(Args)]
pub struct BuildArgs {
    /// Clawfile, or a directory containing one
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Tag for the built image
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Run the build command.
///
/// # Errors
///
/// Returns an error on a parse failure, an unknown `CLAW_TYPE`, or a
/// failed image build.
pub async fn run(app: &AppContext, args: &BuildArgs) -> Result<ExitCode> {
    build_image(&args.path, args.tag.as_deref(), &app.engine, &HostFs, &app.reporter()).await?;
    Ok(ExitCode::SUCCESS)
}
