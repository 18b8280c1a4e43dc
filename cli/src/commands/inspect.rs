//! `claw inspect`: decoded claw labels of a local image.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::inspect::inspect_image;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Image reference
    pub image: String,
}

/// Run the inspect command.
///
/// # Errors
///
/// Returns an error when the image cannot be inspected.
pub async fn run(app: &AppContext, args: &InspectArgs) -> Result<ExitCode> {
    let info = inspect_image(&app.engine, &args.image).await?;
    app.renderer().render_inspect(&args.image, &info)?;
    Ok(ExitCode::SUCCESS)
}
