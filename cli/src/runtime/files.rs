//! File writes with explicit unix permissions.

use std::io;
use std::path::Path;

/// Create `dir` and its parents, then set its mode.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn ensure_dir(dir: &Path, mode: u32) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    set_mode(dir, mode)
}

/// Write `content` to `path`, creating parent directories (0700) first.
///
/// # Errors
///
/// Returns the underlying I/O error.
pub fn write_file(path: &Path, content: impl AsRef<[u8]>, mode: u32) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        ensure_dir(parent, 0o700)?;
    }
    std::fs::write(path, content)?;
    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
