//! `claw doctor`: engine, buildx and compose availability.

use std::process::ExitCode;

use anyhow::{Result, bail};

use crate::app::AppContext;
use crate::application::services::doctor::run_checks;

/// Run the doctor command.
///
/// # Errors
///
/// Returns an error when any check fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let checks = run_checks(&app.runner, &app.config.engine.binary).await;
    app.renderer().render_doctor(&checks)?;
    if checks.iter().any(|c| !c.ok) {
        bail!("one or more checks failed");
    }
    Ok(ExitCode::SUCCESS)
}
