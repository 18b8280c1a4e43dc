//! Output formatting module

pub mod human;
pub mod json;
pub mod reporter;
pub mod styles;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::agent_add::AgentAddOutcome;
use crate::domain::health::{CheckResult, HealthRow};
use crate::domain::inspect::ClawInfo;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.ok));
        }
    }

    /// Print a warning message. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("{} {msg}", "[claw] warning:".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.fail));
    }

    /// Print a plain line. Suppressed when `quiet`.
    pub fn line(&self, msg: &str) {
        if !self.quiet {
            println!("{msg}");
        }
    }
}

/// Renders command results in the selected output mode.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_health(&self, rows: &[HealthRow]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_health(rows);
                Ok(())
            }
            Self::Json(r) => r.render_health(rows),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_inspect(&self, image: &str, info: &ClawInfo) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_inspect(info);
                Ok(())
            }
            Self::Json(r) => r.render_inspect(image, info),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_doctor(&self, checks: &[CheckResult]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_doctor(checks);
                Ok(())
            }
            Self::Json(r) => r.render_doctor(checks),
        }
    }

    /// Human mode already reported each change as it happened.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_agent_add(&self, outcome: &AgentAddOutcome) -> Result<()> {
        match self {
            Self::Human(_) => Ok(()),
            Self::Json(r) => r.render_agent_add(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use owo_colors::OwoColorize;

    use super::*;

    #[test]
    fn test_output_context_no_color_flag_disables_colors() {
        let ctx = OutputContext::new(true, false);
        let styled = format!("{}", "test".style(ctx.styles.ok));
        assert!(!styled.contains("\x1b["));
    }

    #[test]
    fn test_output_context_quiet_flag_sets_quiet() {
        assert!(OutputContext::new(false, true).quiet);
        assert!(!OutputContext::new(false, false).quiet);
    }
}
