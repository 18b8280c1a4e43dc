//! Clawdapus CLI - governed containers for AI agents

use std::process::ExitCode;

use clap::Parser;
use clawdapus_cli::application::services::up::PhaseError;
use clawdapus_cli::cli::Cli;
use clawdapus_cli::output::json::format_error;
use tracing_subscriber::EnvFilter;

/// `CLAW_LOG`, then `RUST_LOG`, then `warn`. Logs go to stderr.
fn init_tracing() {
    let filter = std::env::var("CLAW_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            // Per-service failures are already a complete `[claw] ...` line.
            let message = match e.downcast_ref::<PhaseError>() {
                Some(phase_err) => phase_err.to_string(),
                None => format!("Error: {e:#}"),
            };
            if json && let Ok(obj) = format_error(&format!("{e:#}"), "command_failed") {
                println!("{obj}");
            }
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
