//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain and application code never reach into infra or presentation.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !tracker.process_line(line))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
        .replace('\\', "/")
}

/// Every production line under `layer` that mentions one of `forbidden`.
fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for file in collect_rs_files(&src_dir().join(layer)) {
        for (lineno, line) in production_lines(&file) {
            if forbidden.iter().any(|f| line.contains(f)) {
                out.push(format!("{}:{lineno}: {}", rel(&file), line.trim()));
            }
        }
    }
    out
}

// ── Layer imports ─────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_outward_imports() {
    let found = violations(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "crate::drivers",
            "crate::app::",
        ],
    );
    assert!(found.is_empty(), "domain/ imports an outer layer:\n{}", found.join("\n"));
}

#[test]
fn application_does_not_import_infra_or_presentation() {
    let found = violations(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );
    assert!(found.is_empty(), "application/ imports infra or presentation:\n{}", found.join("\n"));
}

#[test]
fn application_reaches_the_filesystem_through_local_fs() {
    let found = violations("application", &["std::fs", "files::write_file", "files::ensure_dir"]);
    assert!(found.is_empty(), "application/ touches the filesystem directly:\n{}", found.join("\n"));
}

#[test]
fn drivers_do_not_import_infra_or_presentation() {
    let found = violations(
        "drivers",
        &["crate::infra", "crate::commands", "crate::output", "crate::app::"],
    );
    assert!(found.is_empty(), "drivers/ import infra or presentation:\n{}", found.join("\n"));
}

#[test]
fn infra_does_not_import_presentation() {
    let found = violations("infra", &["crate::commands", "crate::output", "crate::app::"]);
    assert!(found.is_empty(), "infra/ imports presentation:\n{}", found.join("\n"));
}

// ── Output discipline ─────────────────────────────────────────────────────────

#[test]
fn no_direct_printing_below_presentation() {
    let mut found = Vec::new();
    for layer in ["domain", "application", "drivers", "runtime", "infra"] {
        found.extend(violations(layer, &["println!", "eprintln!", "print!("]));
    }
    assert!(
        found.is_empty(),
        "print macros below the presentation layer; use ProgressReporter or tracing:\n{}",
        found.join("\n")
    );
}

#[test]
fn no_inline_json_branching_in_commands() {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir().join("commands")) {
        for (lineno, line) in production_lines(&file) {
            let trimmed = line.trim();
            if line.contains("json: bool")
                || trimmed.starts_with("if json")
                || trimmed.starts_with("if !json")
            {
                found.push(format!("{}:{lineno}: {trimmed}", rel(&file)));
            }
        }
    }
    assert!(
        found.is_empty(),
        "Found inline JSON branching in commands/; use app.renderer() instead:\n{}",
        found.join("\n")
    );
}

// ── Process spawning ──────────────────────────────────────────────────────────

#[test]
fn no_tokio_command_runner_construction_outside_infra() {
    let mut found = Vec::new();
    for file in collect_rs_files(&src_dir()) {
        let path = rel(&file);
        if path.contains("/infra/") || path.ends_with("/app.rs") {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            if line.contains("TokioCommandRunner::") {
                found.push(format!("{path}:{lineno}: {}", line.trim()));
            }
        }
    }
    assert!(
        found.is_empty(),
        "TokioCommandRunner constructed outside infra/ and app.rs:\n{}",
        found.join("\n")
    );
}

#[test]
fn no_raw_process_spawning_outside_infra() {
    let mut found = Vec::new();
    for layer in ["domain", "application", "drivers", "runtime", "commands"] {
        found.extend(violations(layer, &["std::process::Command", "tokio::process::Command"]));
    }
    assert!(found.is_empty(), "process spawning outside infra/:\n{}", found.join("\n"));
}
