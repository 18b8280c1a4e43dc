//! Per-agent context directories read by the LLM proxy.
//!
//! Layout: `<runtime>/context/<agent-id>/{AGENTS.md,CLAWDAPUS.md,metadata.json}`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use super::files::{ensure_dir, write_file};

/// Identity the proxy attaches to requests carrying the agent's token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentMetadata {
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u32>,
    pub pod: String,
    #[serde(rename = "type")]
    pub claw_type: String,
    pub token: String,
}

/// Inputs for one agent's context directory.
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub agent_id: String,
    pub agents_md: String,
    pub clawdapus_md: String,
    pub metadata: AgentMetadata,
}

#[must_use]
pub fn context_root(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("context")
}

#[must_use]
pub fn auth_dir(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("proxy-auth")
}

/// Write every agent's context directory.
///
/// # Errors
///
/// Returns an error for an empty agent id or a failed write.
pub fn write_context_dirs(runtime_dir: &Path, agents: &[AgentContext]) -> Result<()> {
    let root = context_root(runtime_dir);
    for agent in agents {
        if agent.agent_id.is_empty() {
            bail!("agent id must not be empty");
        }
        let dir = root.join(&agent.agent_id);
        ensure_dir(&dir, 0o700)
            .with_context(|| format!("creating context dir for {:?}", agent.agent_id))?;
        write_file(&dir.join("AGENTS.md"), &agent.agents_md, 0o644)
            .with_context(|| format!("writing AGENTS.md for {:?}", agent.agent_id))?;
        write_file(&dir.join("CLAWDAPUS.md"), &agent.clawdapus_md, 0o644)
            .with_context(|| format!("writing CLAWDAPUS.md for {:?}", agent.agent_id))?;
        let meta = serde_json::to_string_pretty(&agent.metadata).context("encoding metadata")?;
        write_file(&dir.join("metadata.json"), meta, 0o644)
            .with_context(|| format!("writing metadata.json for {:?}", agent.agent_id))?;
        tracing::debug!(agent = %agent.agent_id, dir = %dir.display(), "wrote proxy context");
    }
    Ok(())
}
