//! Application service: thin `down`, `ps` and `logs` wrappers over the
//! engine's compose command, run against the generated compose file.
//!
//! Engine exit codes pass through to the caller unchanged.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Result, bail};

use crate::application::ports::ContainerEngine;

/// File name of the emitted compose document.
pub const COMPOSE_GENERATED: &str = "compose.generated.yml";

/// `compose.generated.yml` beside the pod file.
#[must_use]
pub fn generated_path(pod_file: &Path) -> PathBuf {
    pod_dir(pod_file).join(COMPOSE_GENERATED)
}

/// Directory holding the pod file; `.` for a bare file name.
#[must_use]
pub fn pod_dir(pod_file: &Path) -> &Path {
    match pod_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// The generated compose file, which must already exist.
///
/// # Errors
///
/// Returns an error when `claw up` has not produced it yet.
pub fn require_generated(pod_file: &Path) -> Result<PathBuf> {
    let path = generated_path(pod_file);
    if !path.is_file() {
        bail!("no {COMPOSE_GENERATED} found (run 'claw up' first)");
    }
    Ok(path)
}

/// # Errors
///
/// Returns an error when the generated file is missing or the engine
/// cannot be spawned.
pub async fn down(engine: &dyn ContainerEngine, pod_file: &Path) -> Result<ExitStatus> {
    let generated = require_generated(pod_file)?;
    engine.compose(&generated, &["down"]).await
}

/// # Errors
///
/// Returns an error when the generated file is missing or the engine
/// cannot be spawned.
pub async fn ps(engine: &dyn ContainerEngine, pod_file: &Path) -> Result<ExitStatus> {
    let generated = require_generated(pod_file)?;
    engine.compose(&generated, &["ps"]).await
}

/// # Errors
///
/// Returns an error when the generated file is missing or the engine
/// cannot be spawned.
pub async fn logs(
    engine: &dyn ContainerEngine,
    pod_file: &Path,
    follow: bool,
    services: &[String],
) -> Result<ExitStatus> {
    let generated = require_generated(pod_file)?;
    let mut args = vec!["logs"];
    if follow {
        args.push("-f");
    }
    args.extend(services.iter().map(String::as_str));
    engine.compose(&generated, &args).await
}
