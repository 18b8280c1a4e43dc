//! `claw health`: probe every container of the running pod.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::health::check_health;
use crate::application::services::lifecycle::require_generated;
use crate::commands::PodFileArgs;
use crate::drivers::registry;

/// Run the health command.
///
/// # Errors
///
/// Returns an error when `claw up` has not run or the container list
/// cannot be read.
pub async fn run(app: &AppContext, args: &PodFileArgs) -> Result<ExitCode> {
    let compose_file = require_generated(&args.file)?;
    let rows = check_health(&app.engine, registry(), &compose_file).await?;
    app.renderer().render_health(&rows)?;
    Ok(ExitCode::SUCCESS)
}
