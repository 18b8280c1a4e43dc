//! Application service: `claw agent add`.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every path is checked before anything is written; a conflict leaves the
//! pod untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::application::ports::{LocalFs, ProgressReporter};
use crate::domain::error::ScaffoldError;
use crate::domain::pod::parse_pod;
use crate::domain::scaffold::{
    AgentPlan, AgentRequest, DEFAULT_AGENT_CONTRACT, PodContext, append_env_example,
    ensure_volumes, insert_service, plan_agent, planned_changes, render_clawfile, render_service,
    rewire_contracts,
};

const ENV_EXAMPLE: &str = ".env.example";

/// What `add_agent` decided and whether it wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAddOutcome {
    pub plan: AgentPlan,
    pub planned: Vec<String>,
    pub written: bool,
}

/// Scaffold a new agent into the pod at `pod_file`.
///
/// # Errors
///
/// Returns an error for an unreadable or malformed pod, rejected flags, an
/// existing service or file, or a failed write.
pub fn add_agent(
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    pod_file: &Path,
    req: &AgentRequest,
    dry_run: bool,
) -> Result<AgentAddOutcome> {
    let pod_yaml = fs
        .read_to_string(pod_file)
        .with_context(|| format!("read pod file {}", pod_file.display()))?;
    let pod = parse_pod(&pod_yaml)?;
    let pod_dir = pod_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let dir_name = std::path::absolute(pod_dir)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();

    let plan = plan_agent(&PodContext::from_pod(&pod, &dir_name), req)?;
    let agent_dir = pod_dir.join(plan.agent_dir());
    let clawfile_path = agent_dir.join("Clawfile");
    let agents_md_path = agent_dir.join("AGENTS.md");
    if let Some((_, target)) = &plan.shared {
        check_shared_target(target)?;
    }
    let shared_path = plan
        .shared
        .as_ref()
        .map(|(_, target)| pod_relative(pod_dir, target));

    let mut creates = vec![clawfile_path.clone()];
    if plan.create_agent_file {
        creates.push(agents_md_path.clone());
    }
    creates.extend(shared_path.clone());
    for path in &creates {
        if fs.exists(path) {
            let shown = path.strip_prefix(pod_dir).unwrap_or(path);
            return Err(ScaffoldError::FileExists(shown.display().to_string()).into());
        }
    }

    let mut updated = insert_service(&pod_yaml, &plan.name, &render_service(&plan))?;
    updated = ensure_volumes(&updated, plan.volumes.keys())?;
    let mut rewired = 0;
    if let Some((source, target)) = &plan.shared {
        (updated, rewired) = rewire_contracts(&updated, source, target);
    }

    let pod_name = pod_file
        .file_name()
        .map_or_else(|| "claw-pod.yml".to_string(), |n| n.to_string_lossy().into_owned());
    let planned = planned_changes(&plan, &pod_name, rewired);
    reporter.event("planned changes:");
    for line in &planned {
        reporter.step(line);
    }
    if dry_run {
        reporter.event("dry-run enabled; no files were written");
        return Ok(AgentAddOutcome {
            plan,
            planned,
            written: false,
        });
    }

    fs.create_dir_all(&agent_dir.join("skills"))?;
    fs.write(&clawfile_path, render_clawfile(&plan))?;
    if plan.create_agent_file {
        fs.write(&agents_md_path, DEFAULT_AGENT_CONTRACT.to_string())?;
    }
    if let (Some((source, _)), Some(shared_path)) = (&plan.shared, &shared_path) {
        let content = fs
            .read_to_string(&pod_relative(pod_dir, source))
            .with_context(|| format!("read shared contract source {source}"))?;
        if let Some(parent) = shared_path.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.write(shared_path, content)?;
    }
    fs.write(pod_file, updated)?;

    if !plan.env_example_vars.is_empty() {
        let env_path = pod_dir.join(ENV_EXAMPLE);
        let existing = if fs.exists(&env_path) {
            fs.read_to_string(&env_path)?
        } else {
            String::new()
        };
        let (content, added) = append_env_example(&existing, &plan.env_example_vars);
        if !added.is_empty() {
            fs.write(&env_path, content)?;
        }
    }

    for line in &planned {
        if let Some(created) = line.strip_prefix("+ create ") {
            reporter.success(&format!("created {created}"));
        }
    }
    reporter.success(&format!("updated {pod_name}"));
    Ok(AgentAddOutcome {
        plan,
        planned,
        written: true,
    })
}

/// Join a `./`-relative contract path onto the pod directory.
fn pod_relative(pod_dir: &Path, path: &str) -> PathBuf {
    pod_dir.join(path.trim_start_matches("./"))
}

fn check_shared_target(target: &str) -> Result<()> {
    if Path::new(target.trim_start_matches("./"))
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        bail!("shared contract {target:?} must stay inside the pod directory");
    }
    Ok(())
}
