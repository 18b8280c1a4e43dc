//! `claw agent` subcommands.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::services::agent_add::add_agent;
use crate::commands::PodFileArgs;
use crate::domain::scaffold::AgentRequest;
use crate::infra::fs::HostFs;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Scaffold a new agent into the pod
    Add(AddArgs),
}

/// Arguments for `agent add`.
#[derive(Args)]
pub struct AddArgs {
    /// Agent (and service) name
    pub name: String,

    #[command(flatten)]
    pub pod: PodFileArgs,

    /// Runtime type (openclaw, nullclaw, nanoclaw)
    #[arg(long = "type")]
    pub claw_type: Option<String>,

    /// Primary model, `provider/model`
    #[arg(long)]
    pub model: Option<String>,

    /// Route LLM calls through the proxy: yes, no, or inherit
    #[arg(long)]
    pub cllama: Option<String>,

    /// Chat platform: discord, slack, telegram, or none
    #[arg(long)]
    pub platform: Option<String>,

    /// Reuse an existing contract, relative to the pod root
    #[arg(long)]
    pub contract: Option<String>,

    /// Volume surface, `name[:mode]` (repeatable)
    #[arg(long = "volume")]
    pub volumes: Vec<String>,

    /// Contract path whose users are rewired to the shared contract
    #[arg(long, requires = "shared")]
    pub rewire_from: Option<String>,

    /// Shared contract path created from --rewire-from
    #[arg(long, requires = "rewire_from")]
    pub shared: Option<String>,

    /// Print the planned changes without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run an agent subcommand.
///
/// # Errors
///
/// Returns an error for rejected input, an existing service or file, or a
/// failed write.
pub fn run(app: &AppContext, cmd: &AgentCommand) -> Result<ExitCode> {
    match cmd {
        AgentCommand::Add(args) => {
            let req = AgentRequest {
                name: args.name.clone(),
                claw_type: args.claw_type.clone(),
                model: args.model.clone(),
                cllama: args.cllama.clone(),
                platform: args.platform.clone(),
                contract: args.contract.clone(),
                volumes: args.volumes.clone(),
                rewire_from: args.rewire_from.clone(),
                shared: args.shared.clone(),
            };
            let outcome = add_agent(&HostFs, &app.reporter(), &args.pod.file, &req, args.dry_run)?;
            app.renderer().render_agent_add(&outcome)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
