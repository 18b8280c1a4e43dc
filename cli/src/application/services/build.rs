//! Application service: `claw build`.
//!
//! Compiles a Clawfile into `Dockerfile.generated` next to it and hands the
//! result to the engine's build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::application::ports::{ContainerEngine, LocalFs, ProgressReporter};
use crate::domain::clawfile;
use crate::drivers::registry;

/// File name of the generated build file.
pub const GENERATED_DOCKERFILE: &str = "Dockerfile.generated";

/// Resolve a path argument to a Clawfile: a directory must contain a
/// `Clawfile`, anything else is taken as the Clawfile itself.
///
/// # Errors
///
/// Returns an error when the input or the directory's Clawfile is missing.
pub fn resolve_clawfile_path(fs: &dyn LocalFs, input: &Path) -> Result<PathBuf> {
    if !fs.exists(input) {
        bail!("input path {:?} does not exist", input.display().to_string());
    }
    if !fs.is_dir(input) {
        return Ok(input.to_path_buf());
    }
    let clawfile = input.join("Clawfile");
    if !fs.exists(&clawfile) {
        bail!("no Clawfile found in directory {:?}", input.display().to_string());
    }
    Ok(clawfile)
}

/// Parse `clawfile`, check its `CLAW_TYPE` has a driver, and write the
/// generated build file beside it.
///
/// # Errors
///
/// Returns an error on read, parse, unknown type, or write failure.
pub fn generate(fs: &dyn LocalFs, clawfile: &Path) -> Result<PathBuf> {
    let src = fs
        .read_to_string(clawfile)
        .with_context(|| format!("open clawfile {}", clawfile.display()))?;
    let parsed = clawfile::parse(&src).with_context(|| format!("parse clawfile {}", clawfile.display()))?;
    registry()
        .lookup(&parsed.config.claw_type)
        .with_context(|| format!("validate CLAW_TYPE {:?}", parsed.config.claw_type))?;

    let generated = clawfile
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(GENERATED_DOCKERFILE);
    fs.write(&generated, clawfile::emit(&parsed))?;
    tracing::debug!(path = %generated.display(), "wrote generated build file");
    Ok(generated)
}

/// Resolve, generate and build.
///
/// # Errors
///
/// Returns an error from any step, including a non-zero build exit.
pub async fn build_image(
    input: &Path,
    tag: Option<&str>,
    engine: &dyn ContainerEngine,
    fs: &dyn LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<PathBuf> {
    let clawfile = resolve_clawfile_path(fs, input)?;
    reporter.step(&format!("Generating Dockerfile from {}", clawfile.display()));
    let generated = generate(fs, &clawfile)?;
    reporter.success(&format!("Generated {}", generated.display()));

    reporter.step("Building image");
    let context = generated.parent().unwrap_or_else(|| Path::new("."));
    let status = engine.build(&generated, context, tag).await?;
    if !status.success() {
        bail!("image build failed ({status})");
    }
    if let Some(tag) = tag {
        reporter.success(&format!("Built {tag}"));
    }
    Ok(generated)
}
