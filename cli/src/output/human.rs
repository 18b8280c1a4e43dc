//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::inspect::render_lines;
use crate::domain::health::{CheckResult, HealthRow};
use crate::domain::inspect::ClawInfo;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the `SERVICE STATUS DETAIL` table.
    pub fn render_health(&self, rows: &[HealthRow]) {
        if rows.is_empty() {
            println!("No running containers found.");
            return;
        }
        let mut lines = health_table(rows).into_iter();
        if let Some(header) = lines.next() {
            println!("{}", header.style(self.ctx.styles.header));
        }
        for (line, row) in lines.zip(rows) {
            println!("{}", line.style(self.ctx.styles.health_status(&row.status)));
        }
    }

    pub fn render_inspect(&self, info: &ClawInfo) {
        for line in render_lines(info) {
            println!("{line}");
        }
    }

    /// One `NAME STATUS VERSION|DETAIL` line per check.
    pub fn render_doctor(&self, checks: &[CheckResult]) {
        for check in checks {
            let line = doctor_line(check);
            let style = if check.ok { self.ctx.styles.ok } else { self.ctx.styles.fail };
            println!("{}", line.style(style));
        }
    }
}

// ── Display helpers ───────────────────────────────────────────────────────────

/// Left-aligned columns, each padded to its widest cell plus two spaces.
#[must_use]
pub fn health_table(rows: &[HealthRow]) -> Vec<String> {
    let header = ("SERVICE", "STATUS", "DETAIL");
    let w_service = rows
        .iter()
        .map(|r| r.service.chars().count())
        .chain([header.0.len()])
        .max()
        .unwrap_or_default();
    let w_status = rows
        .iter()
        .map(|r| r.status.chars().count())
        .chain([header.1.len()])
        .max()
        .unwrap_or_default();

    let line = |service: &str, status: &str, detail: &str| {
        format!("{service:<w_service$}  {status:<w_status$}  {detail}")
            .trim_end()
            .to_string()
    };
    std::iter::once(line(header.0, header.1, header.2))
        .chain(rows.iter().map(|r| line(&r.service, &r.status, &r.detail)))
        .collect()
}

/// `%-10s %-4s %s` with the version when present, else the failure detail.
#[must_use]
pub fn doctor_line(check: &CheckResult) -> String {
    let status = if check.ok { "OK" } else { "FAIL" };
    let tail = if check.version.is_empty() {
        &check.detail
    } else {
        &check.version
    };
    format!("{:<10} {status:<4} {tail}", check.name)
}
