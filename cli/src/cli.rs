//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Governed containers for AI agents
#[derive(Parser)]
#[command(
    name = "claw",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a Dockerfile from a Clawfile and build the image
    Build(commands::build::BuildArgs),

    /// Generate runtime files and compose, start the pod, verify agents
    Up(commands::up::UpArgs),

    /// Stop and remove the pod
    Down(commands::PodFileArgs),

    /// List pod containers
    Ps(commands::PodFileArgs),

    /// Show pod logs
    Logs(commands::lifecycle::LogsArgs),

    /// Probe the health of pod containers
    Health(commands::PodFileArgs),

    /// Show claw metadata of an image
    Inspect(commands::inspect::InspectArgs),

    /// Check engine, buildx, and compose availability
    Doctor,

    /// Manage agents in a pod
    #[command(subcommand)]
    Agent(commands::agent::AgentCommand),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        let app = AppContext::new(&OutputFlags {
            no_color,
            quiet,
            json,
        })?;
        match command {
            Command::Build(args) => commands::build::run(&app, &args).await,
            Command::Up(args) => commands::up::run(&app, &args).await,
            Command::Down(args) => commands::lifecycle::down(&app, &args).await,
            Command::Ps(args) => commands::lifecycle::ps(&app, &args).await,
            Command::Logs(args) => commands::lifecycle::logs(&app, &args).await,
            Command::Health(args) => commands::health::run(&app, &args).await,
            Command::Inspect(args) => commands::inspect::run(&app, &args).await,
            Command::Doctor => commands::doctor::run(&app).await,
            Command::Agent(cmd) => commands::agent::run(&app, &cmd),
        }
    }
}
