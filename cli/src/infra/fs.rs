//! The host filesystem behind the `LocalFs` port.
//!
//! Scaffold writes (`write`) keep the process umask. Runtime artifacts go
//! through `ensure_dir` and `write_with_mode` so `.claw-runtime/` stays
//! owner-only regardless of umask.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;
use crate::runtime::files;

/// `LocalFs` over `std::fs`.
pub struct HostFs;

impl LocalFs for HostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("create {}", path.display()))
    }

    fn write(&self, path: &Path, content: String) -> Result<()> {
        std::fs::write(path, content).with_context(|| format!("write {}", path.display()))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }

    fn ensure_dir(&self, path: &Path, mode: u32) -> Result<()> {
        files::ensure_dir(path, mode).with_context(|| format!("create {}", path.display()))
    }

    fn write_with_mode(&self, path: &Path, content: &str, mode: u32) -> Result<()> {
        files::write_file(path, content, mode).with_context(|| format!("write {}", path.display()))
    }
}
