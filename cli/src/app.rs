//! Application context: unified state passed to every command handler.
//!
//! `AppContext` is built once in `Cli::run()` from the global flags and the
//! operator config, and carries the output context and the container engine.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::ClawdapusConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::docker::DockerEngine;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags from the top-level CLI.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Operator config (`~/.claw/config.yaml`).
    pub config: ClawdapusConfig,
    /// Container engine CLI.
    pub engine: DockerEngine<TokioCommandRunner>,
    /// Raw process runner for probes that bypass the engine port (`doctor`).
    pub runner: TokioCommandRunner,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn new(flags: &OutputFlags) -> Result<Self> {
        let config = YamlConfigStore.load()?;
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        let engine = DockerEngine::with_binary(&config.engine.binary);
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            config,
            engine,
            runner: TokioCommandRunner::default(),
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for application services.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output, self.is_json())
    }
}
