//! Application service: `claw doctor`.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::CommandRunner;
use crate::domain::health::CheckResult;

/// Probe the engine CLI, its build plugin, and compose.
///
/// A probe that cannot be spawned counts as a failed check; this function
/// itself never fails.
pub async fn run_checks(runner: &impl CommandRunner, binary: &str) -> Vec<CheckResult> {
    vec![
        check(runner, "docker", binary, &["version", "--format", "{{.Client.Version}}"]).await,
        check(runner, "buildkit", binary, &["buildx", "version"]).await,
        check(runner, "compose", binary, &["compose", "version", "--short"]).await,
    ]
}

async fn check(runner: &impl CommandRunner, name: &str, binary: &str, args: &[&str]) -> CheckResult {
    match runner.run(binary, args).await {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            if !output.status.success() {
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
            }
            CheckResult::from_output(name, output.status.success(), &combined)
        }
        Err(e) => CheckResult::from_output(name, false, &format!("{e:#}")),
    }
}
