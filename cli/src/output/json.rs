//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty-printed object per command to stdout.
//! `format_error` is the error object printed by every `--json` code path
//! when a command fails.

use anyhow::{Context, Result};
use serde_json::json;

use crate::application::services::agent_add::AgentAddOutcome;
use crate::domain::health::{CheckResult, HealthRow};
use crate::domain::inspect::ClawInfo;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &serde_json::Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_health(&self, rows: &[HealthRow]) -> Result<()> {
        Self::print(&json!({ "services": rows }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inspect(&self, image: &str, info: &ClawInfo) -> Result<()> {
        Self::print(&json!({
            "image": image,
            "isClaw": info.is_claw(),
            "info": info,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_doctor(&self, checks: &[CheckResult]) -> Result<()> {
        Self::print(&json!({
            "ok": checks.iter().all(|c| c.ok),
            "checks": checks,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_agent_add(&self, outcome: &AgentAddOutcome) -> Result<()> {
        Self::print(&json!({
            "agent": outcome.plan.name,
            "clawType": outcome.plan.claw_type,
            "planned": outcome.planned,
            "written": outcome.written,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_has_stable_keys() {
        let text = format_error("boom", "E_UP").expect("json");
        let v: serde_json::Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(v["error"], true);
        assert_eq!(v["message"], "boom");
        assert_eq!(v["code"], "E_UP");
    }
}
