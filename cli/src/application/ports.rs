//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::ClawdapusConfig;
use crate::domain::health::ContainerState;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Captured result of a command run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Lossy UTF-8 stdout.
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Lossy UTF-8 stderr, trimmed.
    #[must_use]
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Labels and state of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerDetails {
    pub labels: BTreeMap<String, String>,
    pub state: ContainerState,
}

// ── Process Port ──────────────────────────────────────────────────────────────

/// Abstracts external process execution so application services can be
/// tested without spawning real processes.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Container Engine Port ─────────────────────────────────────────────────────

/// The container engine CLI as seen by the pipeline.
///
/// Object safe so drivers can receive it as `&dyn ContainerEngine`.
#[async_trait(?Send)]
pub trait ContainerEngine {
    /// `Config.Labels` of a local image.
    async fn image_labels(&self, image: &str) -> Result<BTreeMap<String, String>>;
    /// `Config.Env` of a local image, split on the first `=`.
    async fn image_env(&self, image: &str) -> Result<BTreeMap<String, String>>;
    /// Read one regular file out of an image without starting it.
    async fn copy_from_image(&self, image: &str, path: &str) -> Result<Vec<u8>>;
    /// Build `dockerfile` with `context`, streaming engine output.
    async fn build(&self, dockerfile: &Path, context: &Path, tag: Option<&str>) -> Result<ExitStatus>;
    /// `compose -f <file> <args...>` with inherited stdio.
    async fn compose(&self, compose_file: &Path, args: &[&str]) -> Result<ExitStatus>;
    /// Container IDs for the compose project, optionally for one service.
    async fn compose_ps_ids(&self, compose_file: &Path, service: Option<&str>) -> Result<Vec<String>>;
    async fn container_details(&self, container_id: &str) -> Result<ContainerDetails>;
    /// Run `cmd` inside a running container.
    async fn exec(&self, container_id: &str, cmd: &[&str], timeout: Duration) -> Result<ExecOutput>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit a `[claw] ...` pipeline event line.
    fn event(&self, message: &str);
}

// ── Config and Filesystem Ports ───────────────────────────────────────────────

/// Abstracts loading the operator config file.
pub trait ConfigStore {
    /// Load the config, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<ClawdapusConfig>;
    /// Location the config is read from.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

/// Host filesystem access for the scaffold and `up` services.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write(&self, path: &Path, content: String) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Create `path` and its parents, then restrict it to `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or chmodded.
    fn ensure_dir(&self, path: &Path, mode: u32) -> Result<()>;
    /// Write `content` with unix permissions `mode`, creating parents 0700.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write_with_mode(&self, path: &Path, content: &str, mode: u32) -> Result<()>;
}
