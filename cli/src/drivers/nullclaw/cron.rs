//! Scheduled jobs registered through `nullclaw cron` inside the container.
//!
//! Registration lists existing entries first and only adds missing ones,
//! so applying the same invocations twice creates no duplicates.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use claw_common::Invocation;

use crate::application::ports::{ContainerEngine, ExecOutput};
use crate::domain::health::short_container_id;

const EXEC_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of registering one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronOutcome {
    Exists(String),
    Registered(String),
}

/// `nullclaw agent -m '<message>'`
///
/// # Errors
///
/// Returns an error for an empty message.
pub fn invocation_command(message: &str) -> Result<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        bail!("empty invocation message");
    }
    Ok(format!("nullclaw agent -m {}", shell_quote(trimmed)))
}

/// POSIX single-quote `s`.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

fn entry_key(expr: &str, command: &str) -> String {
    format!("{}\x1f{}", expr.trim(), command.trim())
}

/// Keys of the entries printed by `nullclaw cron list`.
///
/// Lines look like `<id> | <expr> | ... cmd: <command>`; anything else is
/// ignored.
#[must_use]
pub fn parse_cron_list(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains(" | ") && line.contains("cmd:"))
        .filter_map(|line| {
            let expr = line.split('|').nth(1)?.trim();
            let (_, cmd) = line.rsplit_once("cmd:")?;
            let cmd = cmd.trim();
            (!expr.is_empty() && !cmd.is_empty()).then(|| entry_key(expr, cmd))
        })
        .collect()
}

fn failure_detail(output: &ExecOutput) -> String {
    let stderr = output.stderr_str();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = output.stdout_str().trim().to_string();
    if stdout.is_empty() { "no output".to_string() } else { stdout }
}

/// Register every invocation missing from the container's cron table.
///
/// # Errors
///
/// Returns an error when listing or adding fails.
pub async fn register(
    engine: &dyn ContainerEngine,
    container_id: &str,
    invocations: &[Invocation],
) -> Result<Vec<CronOutcome>> {
    let listing = engine
        .exec(container_id, &["nullclaw", "cron", "list"], EXEC_TIMEOUT)
        .await
        .with_context(|| format!("listing cron jobs in {}", short_container_id(container_id)))?;
    if !listing.success() {
        bail!("cron list failed (exit: {}): {}", listing.exit_code, failure_detail(&listing));
    }
    let mut existing =
        parse_cron_list(&format!("{}\n{}", listing.stdout_str(), String::from_utf8_lossy(&listing.stderr)));

    let mut outcomes = Vec::with_capacity(invocations.len());
    for inv in invocations {
        if !inv.name.trim().is_empty() {
            tracing::warn!(name = %inv.name, "nullclaw cron does not support job names; ignoring");
        }
        if !inv.to.trim().is_empty() {
            tracing::warn!(to = %inv.to, "nullclaw cron does not support delivery targets; ignoring");
        }
        let command = invocation_command(&inv.message)?;
        let key = entry_key(&inv.schedule, &command);
        if existing.contains(&key) {
            outcomes.push(CronOutcome::Exists(inv.schedule.clone()));
            continue;
        }
        let added = engine
            .exec(
                container_id,
                &["nullclaw", "cron", "add", inv.schedule.as_str(), command.as_str()],
                EXEC_TIMEOUT,
            )
            .await
            .with_context(|| format!("adding cron job (schedule: {})", inv.schedule))?;
        if !added.success() {
            bail!(
                "cron add failed (schedule: {}, exit: {}): {}",
                inv.schedule,
                added.exit_code,
                failure_detail(&added)
            );
        }
        existing.insert(key);
        outcomes.push(CronOutcome::Registered(inv.schedule.clone()));
    }
    Ok(outcomes)
}
