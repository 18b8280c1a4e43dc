//! Generated skills and their projection into containers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use claw_common::HandleInfo;

use super::files::write_file;
use crate::domain::markdown::{
    channel_skill, channel_skill_name, handle_skill, handle_skill_name, service_skill,
    service_skill_name,
};
use crate::domain::resolved::{Mount, ResolvedSkill, SkillLayout};
use crate::domain::surface::{SCHEME_CHANNEL, SCHEME_SERVICE, Surface};

#[must_use]
pub fn skills_dir(service_runtime_dir: &Path) -> PathBuf {
    service_runtime_dir.join("skills")
}

/// Write companion skills for service surfaces, channel surfaces and
/// handles under `<service runtime>/skills/`.
///
/// A service target with an entry in `emitted` gets that content (the
/// skill its image publishes) instead of the generated fallback. Service
/// skills come first, then channel skills, then handle skills (sorted by
/// platform); later entries replace earlier ones by name.
///
/// # Errors
///
/// Returns an error for a service surface with no usable target or a
/// failed write.
pub fn write_generated_skills(
    service_runtime_dir: &Path,
    surfaces: &[Surface],
    handles: &BTreeMap<String, HandleInfo>,
    emitted: &BTreeMap<String, Vec<u8>>,
) -> Result<Vec<ResolvedSkill>> {
    let dir = skills_dir(service_runtime_dir);
    let mut generated = Vec::new();
    let mut seen = HashSet::new();

    for surface in surfaces.iter().filter(|s| s.scheme == SCHEME_SERVICE) {
        let Some(name) = service_skill_name(&surface.target) else {
            bail!("invalid service target for generated skill: {:?}", surface.target);
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        let target = surface.target.trim();
        let skill = match emitted.get(target) {
            Some(content) => write_skill(&dir, name, content)?,
            None => write_skill(&dir, name, service_skill(target, &surface.ports))?,
        };
        generated.push(skill);
    }

    let mut channel = Vec::new();
    for surface in surfaces.iter().filter(|s| s.scheme == SCHEME_CHANNEL) {
        let name = channel_skill_name(&surface.target);
        if !seen.insert(name.clone()) {
            continue;
        }
        channel.push(write_skill(&dir, name, channel_skill(surface))?);
    }
    generated = merge_skills(generated, channel);

    let mut handle = Vec::new();
    for (platform, info) in handles {
        let name = handle_skill_name(platform);
        handle.push(write_skill(&dir, name, handle_skill(platform, info))?);
    }
    Ok(merge_skills(generated, handle))
}

fn write_skill(dir: &Path, name: String, content: impl AsRef<[u8]>) -> Result<ResolvedSkill> {
    let host_path = dir.join(&name);
    write_file(&host_path, content, 0o644)
        .with_context(|| format!("writing skill {}", host_path.display()))?;
    Ok(ResolvedSkill { name, host_path })
}

/// Merge `overrides` into `base`: same-named skills are replaced in
/// place, new ones are appended.
#[must_use]
pub fn merge_skills(base: Vec<ResolvedSkill>, overrides: Vec<ResolvedSkill>) -> Vec<ResolvedSkill> {
    let mut merged = base;
    let mut by_name: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.clone(), i))
        .collect();
    for skill in overrides {
        if let Some(&i) = by_name.get(&skill.name) {
            merged[i] = skill;
        } else {
            by_name.insert(skill.name.clone(), merged.len());
            merged.push(skill);
        }
    }
    merged
}

/// Read-only mounts placing each skill inside the runtime's skill dir.
#[must_use]
pub fn projection_mounts(skills: &[ResolvedSkill], skill_dir: &str, layout: SkillLayout) -> Vec<Mount> {
    if skill_dir.is_empty() {
        return Vec::new();
    }
    let dir = skill_dir.trim_end_matches('/');
    skills
        .iter()
        .map(|skill| {
            let container_path = match layout {
                SkillLayout::Flat => format!("{dir}/{}", skill.name),
                SkillLayout::Directory => {
                    let stem = Path::new(&skill.name)
                        .file_stem()
                        .map_or_else(|| skill.name.clone(), |s| s.to_string_lossy().into_owned());
                    format!("{dir}/{stem}/SKILL.md")
                }
            };
            Mount::read_only(skill.host_path.clone(), container_path)
        })
        .collect()
}
