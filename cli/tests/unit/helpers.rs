//! Shared test helpers: fake ports and output constructors.

#![allow(dead_code, clippy::expect_used)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use clawdapus_cli::application::ports::{
    CommandRunner, ContainerDetails, ContainerEngine, ExecOutput, LocalFs, ProgressReporter,
};
use clawdapus_cli::domain::health::ContainerState;

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

/// Records every reported line, prefixed with its kind.
#[derive(Default)]
pub struct RecordingReporter {
    pub lines: RefCell<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.with_prefix("event: ")
    }

    pub fn warnings(&self) -> Vec<String> {
        self.with_prefix("warn: ")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|l| l.strip_prefix(prefix).map(String::from))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.borrow_mut().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.lines.borrow_mut().push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.lines.borrow_mut().push(format!("warn: {message}"));
    }
    fn event(&self, message: &str) {
        self.lines.borrow_mut().push(format!("event: {message}"));
    }
}

// ── Command runner ───────────────────────────────────────────────────────────

/// Replies by joined argument string; records every call.
#[derive(Default)]
pub struct FakeRunner {
    pub replies: BTreeMap<String, Output>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn reply(mut self, args: &str, output: Output) -> Self {
        self.replies.insert(args.to_string(), output);
        self
    }

    fn lookup(&self, program: &str, args: &[&str]) -> Result<Output> {
        let key = args.join(" ");
        self.calls.borrow_mut().push(format!("{program} {key}"));
        match self.replies.get(&key) {
            Some(o) => Ok(o.clone()),
            None => bail!("failed to spawn {program}"),
        }
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.lookup(program, args)
    }
    async fn run_with_timeout(&self, program: &str, args: &[&str], _: Duration) -> Result<Output> {
        self.lookup(program, args)
    }
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        self.lookup(program, args).map(|o| o.status)
    }
}

// ── Container engine ─────────────────────────────────────────────────────────

/// In-memory engine. Unknown images and containers are errors.
#[derive(Default)]
pub struct FakeEngine {
    pub labels: BTreeMap<String, BTreeMap<String, String>>,
    pub env: BTreeMap<String, BTreeMap<String, String>>,
    /// `(image, path)` → file content.
    pub files: BTreeMap<(String, String), Vec<u8>>,
    /// Service name (empty for all) → container ids.
    pub ps_ids: BTreeMap<String, Vec<String>>,
    pub details: BTreeMap<String, ContainerDetails>,
    /// Container id → exec reply.
    pub exec_replies: BTreeMap<String, ExecOutput>,
    pub compose_code: i32,
    pub calls: RefCell<Vec<String>>,
}

impl FakeEngine {
    pub fn with_image(mut self, image: &str, labels: &[(&str, &str)]) -> Self {
        self.labels.insert(
            image.to_string(),
            labels.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        );
        self
    }

    pub fn with_container(mut self, service: &str, id: &str, labels: &[(&str, &str)], running: bool) -> Self {
        self.ps_ids.entry(service.to_string()).or_default().push(id.to_string());
        self.ps_ids.entry(String::new()).or_default().push(id.to_string());
        self.details.insert(
            id.to_string(),
            ContainerDetails {
                labels: labels.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
                state: ContainerState {
                    running,
                    status: if running { "running" } else { "exited" }.to_string(),
                    health: String::new(),
                },
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl ContainerEngine for FakeEngine {
    async fn image_labels(&self, image: &str) -> Result<BTreeMap<String, String>> {
        self.record(format!("image_labels {image}"));
        match self.labels.get(image) {
            Some(l) => Ok(l.clone()),
            None => bail!("No such image: {image}"),
        }
    }

    async fn image_env(&self, image: &str) -> Result<BTreeMap<String, String>> {
        self.record(format!("image_env {image}"));
        Ok(self.env.get(image).cloned().unwrap_or_default())
    }

    async fn copy_from_image(&self, image: &str, path: &str) -> Result<Vec<u8>> {
        self.record(format!("copy_from_image {image} {path}"));
        match self.files.get(&(image.to_string(), path.to_string())) {
            Some(c) => Ok(c.clone()),
            None => bail!("Could not find the file {path} in container"),
        }
    }

    async fn build(&self, dockerfile: &Path, _: &Path, tag: Option<&str>) -> Result<ExitStatus> {
        self.record(format!("build {} {}", dockerfile.display(), tag.unwrap_or("-")));
        Ok(exit_status(0))
    }

    async fn compose(&self, compose_file: &Path, args: &[&str]) -> Result<ExitStatus> {
        let name = compose_file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.record(format!("compose {name} {}", args.join(" ")));
        Ok(exit_status(self.compose_code))
    }

    async fn compose_ps_ids(&self, _: &Path, service: Option<&str>) -> Result<Vec<String>> {
        Ok(self.ps_ids.get(service.unwrap_or_default()).cloned().unwrap_or_default())
    }

    async fn container_details(&self, container_id: &str) -> Result<ContainerDetails> {
        match self.details.get(container_id) {
            Some(d) => Ok(d.clone()),
            None => bail!("No such container: {container_id}"),
        }
    }

    async fn exec(&self, container_id: &str, cmd: &[&str], _: Duration) -> Result<ExecOutput> {
        self.record(format!("exec {container_id} {}", cmd.join(" ")));
        Ok(self.exec_replies.get(container_id).cloned().unwrap_or_default())
    }
}

// ── Filesystem ───────────────────────────────────────────────────────────────

/// In-memory `LocalFs`.
#[derive(Default)]
pub struct MemFs {
    pub files: RefCell<BTreeMap<PathBuf, String>>,
    pub dirs: RefCell<Vec<PathBuf>>,
}

impl MemFs {
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files.borrow_mut().insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.files.borrow().get(Path::new(path)).cloned()
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().iter().any(|d| d == path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().iter().any(|d| d == path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.dirs.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn write(&self, path: &Path, content: String) -> Result<()> {
        self.files.borrow_mut().insert(path.to_path_buf(), content);
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.files.borrow().get(path) {
            Some(c) => Ok(c.clone()),
            None => bail!("reading file {}: not found", path.display()),
        }
    }

    fn ensure_dir(&self, path: &Path, _mode: u32) -> Result<()> {
        self.create_dir_all(path)
    }

    fn write_with_mode(&self, path: &Path, content: &str, _mode: u32) -> Result<()> {
        self.write(path, content.to_string())
    }
}
