//! The `claw` terminal palette.
//!
//! Roles name what the pipeline prints, not colors. Every role renders
//! plain until [`Styles::colorize`] runs; `OutputContext` skips it for
//! `--no-color`, `NO_COLOR` and non-TTY stdout.

use owo_colors::Style;

#[derive(Default, Clone, Copy)]
pub struct Styles {
    /// The `[claw]` line tag.
    pub tag: Style,
    /// `→` before a pipeline step.
    pub step: Style,
    /// `✓`, healthy containers, passing doctor checks.
    pub ok: Style,
    /// `[claw] warning:` prefix.
    pub warning: Style,
    /// `✗`, failed doctor checks, unhealthy or stopped containers.
    pub fail: Style,
    /// Table headers.
    pub header: Style,
    /// Secondary rows: native services and unknown states.
    pub muted: Style,
}

impl Styles {
    /// Switch every role to its terminal color.
    pub fn colorize(&mut self) {
        *self = Self {
            tag: Style::new().cyan().bold(),
            step: Style::new().cyan(),
            ok: Style::new().green(),
            warning: Style::new().yellow().bold(),
            fail: Style::new().red().bold(),
            header: Style::new().bold().underline(),
            muted: Style::new().dimmed(),
        };
    }

    /// Style for a `claw health` row with the given STATUS cell.
    #[must_use]
    pub fn health_status(&self, status: &str) -> Style {
        match status {
            "healthy" => self.ok,
            "running" | "starting" => Style::new(),
            "unhealthy" | "error" | "exited" | "dead" | "restarting" => self.fail,
            _ => self.muted,
        }
    }
}

#[cfg(test)]
mod tests {
    use owo_colors::OwoColorize as _;

    use super::*;

    fn paint(style: Style) -> String {
        format!("{}", "x".style(style))
    }

    #[test]
    fn test_default_palette_is_plain() {
        let styles = Styles::default();
        for style in [styles.tag, styles.ok, styles.fail, styles.health_status("unhealthy")] {
            assert_eq!(paint(style), "x");
        }
    }

    #[test]
    fn test_colorize_sets_tag_apart_from_step() {
        let mut styles = Styles::default();
        styles.colorize();
        let tag = paint(styles.tag);
        assert!(tag.contains("36"), "{tag:?}");
        assert_ne!(tag, paint(styles.step));
        let fail = paint(styles.fail);
        assert!(fail.contains("31"), "{fail:?}");
    }

    #[test]
    fn test_health_status_roles() {
        let mut styles = Styles::default();
        styles.colorize();
        assert_eq!(paint(styles.health_status("healthy")), paint(styles.ok));
        assert_eq!(paint(styles.health_status("unhealthy")), paint(styles.fail));
        assert_eq!(paint(styles.health_status("exited")), paint(styles.fail));
        assert_eq!(paint(styles.health_status("running")), "x");
        assert_eq!(paint(styles.health_status("unknown")), paint(styles.muted));
    }
}
