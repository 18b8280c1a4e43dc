//! Agent contract and skill resolution against the pod directory.
//!
//! Every operator-supplied path is joined to the pod directory and
//! canonicalized; the canonical path must stay inside the canonical pod
//! directory. Symlinks are followed before the check, so a link pointing
//! outside the pod is rejected like a `..` path.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::domain::error::ResolutionError;
use crate::domain::resolved::ResolvedSkill;

/// A verified agent contract bind mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMount {
    pub host_path: PathBuf,
    /// `agent_file` with `.` and `..` segments folded, `/`-separated.
    pub relative_path: String,
    pub container_path: String,
    pub read_only: bool,
}

/// Resolve the agent contract `agent_file` under `base_dir`.
///
/// # Errors
///
/// Fails closed: an empty name, an absolute path, a path that escapes the
/// pod directory, and a missing file are all errors.
pub fn resolve_contract(base_dir: &Path, agent_file: &str) -> Result<ContractMount, ResolutionError> {
    let agent_file = agent_file.trim();
    if agent_file.is_empty() {
        return Err(ResolutionError::EmptyContract);
    }
    if Path::new(agent_file).is_absolute() {
        return Err(ResolutionError::AbsoluteContract {
            path: agent_file.to_string(),
        });
    }

    let host_path = confine(base_dir, agent_file).map_err(|e| match e {
        Confine::Escapes => ResolutionError::ContractEscapes {
            path: agent_file.to_string(),
        },
        Confine::Missing => ResolutionError::ContractNotFound {
            path: agent_file.to_string(),
        },
        Confine::Io(source) => ResolutionError::Io {
            path: agent_file.to_string(),
            source,
        },
    })?;

    let relative_path = clean_relative(agent_file);
    Ok(ContractMount {
        host_path,
        container_path: format!("/claw/{relative_path}"),
        relative_path,
        read_only: true,
    })
}

/// Resolve skill files under `base_dir`, preserving input order.
///
/// # Errors
///
/// Fails on escaping or missing paths, on anything that is not a regular
/// file, and on two skills sharing a basename (they would collide in the
/// flat skill directory).
pub fn resolve_skills(base_dir: &Path, paths: &[String]) -> Result<Vec<ResolvedSkill>, ResolutionError> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut skills = Vec::with_capacity(paths.len());

    for raw in paths {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ResolutionError::EmptySkill);
        }
        let host_path = confine(base_dir, raw).map_err(|e| match e {
            Confine::Escapes => ResolutionError::SkillEscapes {
                path: raw.to_string(),
            },
            Confine::Missing => ResolutionError::SkillNotFound {
                path: raw.to_string(),
            },
            Confine::Io(source) => ResolutionError::Io {
                path: raw.to_string(),
                source,
            },
        })?;

        let meta = std::fs::metadata(&host_path).map_err(|source| ResolutionError::Io {
            path: raw.to_string(),
            source,
        })?;
        if !meta.is_file() {
            return Err(ResolutionError::SkillNotFile {
                path: raw.to_string(),
            });
        }

        let name = host_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(first) = seen.get(&name) {
            return Err(ResolutionError::DuplicateSkill {
                name,
                first: first.clone(),
                second: raw.to_string(),
            });
        }
        seen.insert(name.clone(), raw.to_string());
        skills.push(ResolvedSkill { name, host_path });
    }

    Ok(skills)
}

/// Lexically fold `.` and `..` out of a path already checked by [`confine`].
fn clean_relative(rel: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}

enum Confine {
    Escapes,
    Missing,
    Io(std::io::Error),
}

/// Canonical path of `rel` under `base`, refusing anything outside it.
fn confine(base: &Path, rel: &str) -> Result<PathBuf, Confine> {
    // Reject lexical escapes before touching the filesystem so a missing
    // `../x` reports as an escape rather than as not found.
    let mut depth: i32 = 0;
    for component in Path::new(rel).components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            Component::RootDir | Component::Prefix(_) => return Err(Confine::Escapes),
            Component::CurDir => {}
        }
        if depth < 0 {
            return Err(Confine::Escapes);
        }
    }

    let canonical_base = base.canonicalize().map_err(Confine::Io)?;
    let canonical = match canonical_base.join(rel).canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(Confine::Missing),
        Err(e) => return Err(Confine::Io(e)),
    };
    if canonical == canonical_base || !canonical.starts_with(&canonical_base) {
        return Err(Confine::Escapes);
    }
    Ok(canonical)
}
