//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"[claw] warning: {message}"`
/// - `event()` prints `"[claw] {message}"`
///
/// Everything is suppressed when `ctx.quiet`. In JSON mode lines go to
/// stderr so stdout stays machine-readable.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    to_stderr: bool,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext, to_stderr: bool) -> Self {
        Self { ctx, to_stderr }
    }

    fn emit(&self, line: &str) {
        if self.ctx.quiet {
            return;
        }
        if self.to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.emit(&format!("  {} {message}", "→".style(self.ctx.styles.step)));
    }

    fn success(&self, message: &str) {
        self.emit(&format!("  {} {message}", "✓".style(self.ctx.styles.ok)));
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        self.emit(&format!(
            "{} {message}",
            "[claw] warning:".style(self.ctx.styles.warning)
        ));
    }

    fn event(&self, message: &str) {
        tracing::info!("{message}");
        self.emit(&format!("{} {message}", "[claw]".style(self.ctx.styles.tag)));
    }
}
