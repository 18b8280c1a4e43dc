//! Clawfile parser.
//!
//! Tokenizes the file as container-build instructions, extracts claw
//! directives into a [`ClawConfig`], and forwards every other instruction
//! verbatim.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::cron::validate_cron;
use super::{ClawConfig, ScheduledCommand, SurfaceDecl, split_leading_fields};
use crate::domain::error::ParseError;
use crate::domain::surface::parse_surface;

static HEREDOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"<<(-?)["']?([A-Za-z_][A-Za-z0-9_]*)["']?"#).expect("valid regex")
});

/// One container-build instruction as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// First physical line, 1-based.
    pub line: usize,
    /// Instruction word as written.
    pub keyword: String,
    /// Text after the keyword, continuations joined.
    pub remainder: String,
    /// Whitespace-split `remainder`.
    pub args: Vec<String>,
    /// Source text, physical lines joined with `\n`.
    pub original: String,
}

/// Output of [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub config: ClawConfig,
    /// Leading `# syntax=` / `# escape=` lines, kept so the generated file
    /// builds with the same frontend.
    pub parser_directives: Vec<String>,
    /// Non-claw instructions in source order.
    pub build_nodes: Vec<Instruction>,
}

/// Parse a Clawfile.
///
/// # Errors
///
/// Returns `ParseError` for malformed or duplicate directives, unknown
/// `CLAW_*` directives, invalid cron or surface declarations, and a missing
/// `CLAW_TYPE`.
pub fn parse(src: &str) -> Result<ParseResult, ParseError> {
    let (parser_directives, instructions) = tokenize(src);

    let mut config = ClawConfig::default();
    let mut claw_type: Option<String> = None;
    let mut build_nodes = Vec::new();

    for inst in instructions {
        let directive = inst.keyword.to_ascii_uppercase();
        match directive.as_str() {
            "CLAW_TYPE" => {
                let value = exactly_one(&inst, "CLAW_TYPE")?;
                set_once(&mut claw_type, value, &inst, "CLAW_TYPE")?;
            }
            "AGENT" => {
                let value = exactly_one(&inst, "AGENT")?;
                set_once(&mut config.agent, value, &inst, "AGENT")?;
            }
            "PERSONA" => {
                let value = exactly_one(&inst, "PERSONA")?;
                set_once(&mut config.persona, value, &inst, "PERSONA")?;
            }
            "CLLAMA" => {
                let value = non_empty_remainder(&inst, "CLLAMA")?;
                set_once(&mut config.cllama, value, &inst, "CLLAMA")?;
            }
            "MODEL" => parse_model(&inst, &mut config.models)?,
            "SURFACE" => {
                let raw = inst.args.join(" ");
                let surface = parse_surface(&raw).map_err(|source| ParseError::Surface {
                    line: inst.line,
                    source,
                })?;
                config.surfaces.push(SurfaceDecl { raw, surface });
            }
            "INVOKE" => config.invocations.push(parse_invoke(&inst)?),
            "PRIVILEGE" => parse_privilege(&inst, &mut config.privileges)?,
            "CONFIGURE" => {
                let value = non_empty_remainder(&inst, "CONFIGURE")?;
                config.configures.push(value);
            }
            "TRACK" => {
                if inst.args.is_empty() {
                    return Err(arity(&inst, "TRACK", "at least one package manager"));
                }
                config.tracks.extend(inst.args.iter().cloned());
            }
            "HANDLE" => {
                let platform = exactly_one(&inst, "HANDLE")?.to_ascii_lowercase();
                if config.handles.contains(&platform) {
                    return Err(ParseError::DuplicateHandle {
                        line: inst.line,
                        platform,
                    });
                }
                config.handles.push(platform);
            }
            "SKILL" => config.skills.push(exactly_one(&inst, "SKILL")?),
            // Reserved: accepted, value discarded.
            "ACT" => {}
            _ if directive.starts_with("CLAW_") => {
                return Err(ParseError::UnknownDirective {
                    line: inst.line,
                    directive: inst.keyword,
                });
            }
            _ => build_nodes.push(inst),
        }
    }

    config.claw_type = claw_type.ok_or(ParseError::MissingClawType)?;
    Ok(ParseResult {
        config,
        parser_directives,
        build_nodes,
    })
}

// ── Directive helpers ─────────────────────────────────────────────────────────

fn arity(inst: &Instruction, directive: &str, expected: &'static str) -> ParseError {
    ParseError::Arity {
        line: inst.line,
        directive: directive.to_string(),
        expected,
    }
}

fn exactly_one(inst: &Instruction, directive: &str) -> Result<String, ParseError> {
    match inst.args.as_slice() {
        [value] => Ok(value.clone()),
        _ => Err(arity(inst, directive, "exactly one argument")),
    }
}

fn non_empty_remainder(inst: &Instruction, directive: &str) -> Result<String, ParseError> {
    let value = inst.remainder.trim();
    if value.is_empty() {
        return Err(arity(inst, directive, "a value"));
    }
    Ok(value.to_string())
}

fn set_once(
    slot: &mut Option<String>,
    value: String,
    inst: &Instruction,
    directive: &str,
) -> Result<(), ParseError> {
    if slot.is_some() {
        return Err(ParseError::Duplicate {
            line: inst.line,
            directive: directive.to_string(),
        });
    }
    *slot = Some(value);
    Ok(())
}

fn parse_model(inst: &Instruction, models: &mut BTreeMap<String, String>) -> Result<(), ParseError> {
    let Some((fields, reference)) = split_leading_fields(&inst.remainder, 1) else {
        return Err(arity(inst, "MODEL", "a slot and a model reference"));
    };
    if reference.is_empty() {
        return Err(arity(inst, "MODEL", "a slot and a model reference"));
    }
    let slot = fields[0].to_string();
    if models.contains_key(&slot) {
        return Err(ParseError::DuplicateModelSlot {
            line: inst.line,
            slot,
        });
    }
    models.insert(slot, reference.trim_end().to_string());
    Ok(())
}

fn parse_invoke(inst: &Instruction) -> Result<ScheduledCommand, ParseError> {
    let Some((fields, command)) = split_leading_fields(&inst.remainder, 5) else {
        return Err(arity(inst, "INVOKE", "a 5-field schedule and a command"));
    };
    if command.is_empty() {
        return Err(arity(inst, "INVOKE", "a 5-field schedule and a command"));
    }
    let schedule = fields.join(" ");
    validate_cron(&schedule).map_err(|source| ParseError::Cron {
        line: inst.line,
        source,
    })?;
    Ok(ScheduledCommand {
        schedule,
        command: command.trim_end().to_string(),
    })
}

fn parse_privilege(
    inst: &Instruction,
    privileges: &mut BTreeMap<String, String>,
) -> Result<(), ParseError> {
    let Some((fields, user)) = split_leading_fields(&inst.remainder, 1) else {
        return Err(arity(inst, "PRIVILEGE", "a mode and a user spec"));
    };
    if user.is_empty() {
        return Err(arity(inst, "PRIVILEGE", "a mode and a user spec"));
    }
    let mode = fields[0].to_string();
    if privileges.contains_key(&mode) {
        return Err(ParseError::DuplicatePrivilege {
            line: inst.line,
            mode,
        });
    }
    privileges.insert(mode, user.trim_end().to_string());
    Ok(())
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

/// Split the source into parser directives and logical instructions.
///
/// Blank lines and comments are dropped. A line ending in the escape
/// character continues onto the next non-comment line. RUN/COPY/ADD heredoc
/// bodies are kept inside the instruction's original text.
fn tokenize(src: &str) -> (Vec<String>, Vec<Instruction>) {
    let lines: Vec<&str> = src.lines().collect();
    let mut escape = '\\';
    let mut directives = Vec::new();
    let mut i = 0;

    while let Some(line) = lines.get(i) {
        let Some((key, value)) = parser_directive(line) else {
            break;
        };
        if key == "escape" && (value == "`" || value == "\\") {
            escape = value.chars().next().unwrap_or('\\');
        }
        directives.push((*line).to_string());
        i += 1;
    }

    let mut instructions = Vec::new();
    while i < lines.len() {
        let start = i;
        let first = lines[i];
        i += 1;
        let trimmed = first.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut original = vec![first];
        let mut logical = String::new();
        let mut current = first;
        loop {
            let end = current.trim_end();
            let Some(joined) = end.strip_suffix(escape) else {
                logical.push_str(end);
                break;
            };
            logical.push_str(joined);
            let mut next = None;
            while let Some(line) = lines.get(i) {
                i += 1;
                original.push(line);
                let t = line.trim();
                if !t.is_empty() && !t.starts_with('#') {
                    next = Some(*line);
                    break;
                }
            }
            match next {
                Some(line) => current = line,
                None => break,
            }
        }

        let logical = logical.trim_start();
        let (keyword, remainder) = match logical.find(char::is_whitespace) {
            Some(pos) => (&logical[..pos], logical[pos..].trim_start()),
            None => (logical, ""),
        };

        if matches!(keyword.to_ascii_uppercase().as_str(), "RUN" | "COPY" | "ADD") {
            for caps in HEREDOC_RE.captures_iter(remainder) {
                let strip_tabs = &caps[1] == "-";
                let word = &caps[2];
                while let Some(line) = lines.get(i) {
                    i += 1;
                    original.push(line);
                    let candidate = if strip_tabs {
                        line.trim_start_matches('\t')
                    } else {
                        line
                    };
                    if candidate == word {
                        break;
                    }
                }
            }
        }

        instructions.push(Instruction {
            line: start + 1,
            keyword: keyword.to_string(),
            remainder: remainder.to_string(),
            args: remainder.split_whitespace().map(str::to_string).collect(),
            original: original.join("\n"),
        });
    }

    (directives, instructions)
}

/// Recognise `# key=value` parser directives.
fn parser_directive(line: &str) -> Option<(String, String)> {
    let body = line.trim().strip_prefix('#')?;
    let (key, value) = body.split_once('=')?;
    let key = key.trim().to_ascii_lowercase();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((key, value.trim().to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = "FROM alpine\nCLAW_TYPE openclaw\n";

    #[test]
    fn test_parse_minimal_clawfile() {
        let result = parse(MINIMAL).unwrap();
        assert_eq!(result.config.claw_type, "openclaw");
        assert_eq!(result.build_nodes.len(), 1);
        assert_eq!(result.build_nodes[0].original, "FROM alpine");
    }

    #[test]
    fn test_parse_full_clawfile() {
        let src = "\
FROM openclaw:latest

# comment
CLAW_TYPE openclaw
AGENT AGENTS.md
MODEL primary openrouter/anthropic/claude-sonnet-4
MODEL fallback anthropic/claude-haiku
CLLAMA passthrough
PERSONA analyst
SURFACE volume://research-cache read-write
SURFACE service://fleet-master
INVOKE 15 8 * * 1-5 Pre-market synthesis
PRIVILEGE worker root
CONFIGURE openclaw config set agents.defaults.heartbeat.every 30m
TRACK apt npm
HANDLE Discord
SKILL ./skills/triage.md
ACT whatever
RUN echo done
";
        let result = parse(src).unwrap();
        let c = &result.config;
        assert_eq!(c.agent.as_deref(), Some("AGENTS.md"));
        assert_eq!(c.models["primary"], "openrouter/anthropic/claude-sonnet-4");
        assert_eq!(c.models["fallback"], "anthropic/claude-haiku");
        assert_eq!(c.cllama.as_deref(), Some("passthrough"));
        assert_eq!(c.persona.as_deref(), Some("analyst"));
        assert_eq!(c.surfaces.len(), 2);
        assert_eq!(c.surfaces[0].raw, "volume://research-cache read-write");
        assert_eq!(c.surfaces[0].surface.access_mode, "read-write");
        assert_eq!(c.invocations[0].schedule, "15 8 * * 1-5");
        assert_eq!(c.invocations[0].command, "Pre-market synthesis");
        assert_eq!(c.privileges["worker"], "root");
        assert_eq!(
            c.configures,
            vec!["openclaw config set agents.defaults.heartbeat.every 30m"]
        );
        assert_eq!(c.tracks, vec!["apt", "npm"]);
        assert_eq!(c.handles, vec!["discord"]);
        assert_eq!(c.skills, vec!["./skills/triage.md"]);
        let kept: Vec<_> = result.build_nodes.iter().map(|n| n.original.as_str()).collect();
        assert_eq!(kept, vec!["FROM openclaw:latest", "RUN echo done"]);
    }

    #[test]
    fn test_parse_directives_are_case_insensitive() {
        let result = parse("from alpine\nclaw_type nanoclaw\nhandle slack\n").unwrap();
        assert_eq!(result.config.claw_type, "nanoclaw");
        assert_eq!(result.config.handles, vec!["slack"]);
    }

    #[test]
    fn test_parse_missing_claw_type_returns_error() {
        assert_eq!(parse("FROM alpine\n"), Err(ParseError::MissingClawType));
    }

    #[test]
    fn test_parse_duplicate_claw_type_cites_line() {
        let err = parse("FROM alpine\nCLAW_TYPE a\nCLAW_TYPE b\n").unwrap_err();
        assert_eq!(err.to_string(), "line 3: duplicate CLAW_TYPE directive");
    }

    #[test]
    fn test_parse_duplicate_agent_returns_error() {
        let err = parse("CLAW_TYPE a\nAGENT one.md\nAGENT two.md\n").unwrap_err();
        assert!(matches!(err, ParseError::Duplicate { line: 3, .. }));
    }

    #[test]
    fn test_parse_unknown_claw_directive_returns_error() {
        let err = parse("CLAW_TYPE a\nCLAW_FROBNICATE x\n").unwrap_err();
        assert_eq!(err.to_string(), "line 2: unknown Claw directive CLAW_FROBNICATE");
    }

    #[test]
    fn test_parse_unknown_instruction_passes_through() {
        let result = parse("CLAW_TYPE a\nHEALTHCHECK NONE\nONBUILD RUN x\n").unwrap();
        assert_eq!(result.build_nodes.len(), 2);
        assert_eq!(result.build_nodes[1].keyword, "ONBUILD");
    }

    #[test]
    fn test_parse_duplicate_model_slot_returns_error() {
        let err = parse("CLAW_TYPE a\nMODEL primary x/y\nMODEL primary z/w\n").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateModelSlot { line: 3, .. }));
    }

    #[test]
    fn test_parse_model_without_reference_returns_error() {
        assert!(matches!(
            parse("CLAW_TYPE a\nMODEL primary\n"),
            Err(ParseError::Arity { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_duplicate_handle_after_normalisation_returns_error() {
        let err = parse("CLAW_TYPE a\nHANDLE discord\nHANDLE DISCORD\n").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateHandle { line: 3, .. }));
    }

    #[test]
    fn test_parse_invalid_cron_returns_error() {
        let err = parse("CLAW_TYPE a\nINVOKE 99 * * * * tick\n").unwrap_err();
        assert!(matches!(err, ParseError::Cron { line: 2, .. }));
    }

    #[test]
    fn test_parse_invoke_without_command_returns_error() {
        assert!(matches!(
            parse("CLAW_TYPE a\nINVOKE 0 9 * * *\n"),
            Err(ParseError::Arity { .. })
        ));
    }

    #[test]
    fn test_parse_surface_access_mode_on_channel_returns_error() {
        let err = parse("CLAW_TYPE a\nSURFACE channel://discord read-only\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: SURFACE channel does not support access mode"
        );
    }

    #[test]
    fn test_parse_empty_configure_returns_error() {
        assert!(parse("CLAW_TYPE a\nCONFIGURE\n").is_err());
    }

    #[test]
    fn test_parse_line_continuation_joins_and_keeps_original() {
        let src = "CLAW_TYPE a\nRUN apt-get update && \\\n    apt-get install -y curl\nCONFIGURE openclaw config set \\\n  a.b 1\n";
        let result = parse(src).unwrap();
        assert_eq!(
            result.build_nodes[0].original,
            "RUN apt-get update && \\\n    apt-get install -y curl"
        );
        assert_eq!(result.config.configures, vec!["openclaw config set a.b 1"]);
    }

    #[test]
    fn test_parse_line_numbers_count_comments_and_blanks() {
        let err = parse("# header\n\nCLAW_TYPE a\n\n# x\nCLAW_NOPE\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownDirective { line: 6, .. }));
    }

    #[test]
    fn test_parse_keeps_parser_directives() {
        let result = parse("# syntax=docker/dockerfile:1\nFROM alpine\nCLAW_TYPE a\n").unwrap();
        assert_eq!(result.parser_directives, vec!["# syntax=docker/dockerfile:1"]);
    }

    #[test]
    fn test_parse_heredoc_body_stays_in_run_node() {
        let src = "FROM alpine\nRUN <<EOF\n# not a comment here\n\nCLAW_TYPE inside\nEOF\nCLAW_TYPE a\n";
        let result = parse(src).unwrap();
        assert_eq!(result.config.claw_type, "a");
        assert_eq!(
            result.build_nodes[1].original,
            "RUN <<EOF\n# not a comment here\n\nCLAW_TYPE inside\nEOF"
        );
    }

    #[test]
    fn test_parse_privilege_keeps_user_spec_remainder() {
        let result = parse("CLAW_TYPE a\nPRIVILEGE docker-socket true\n").unwrap();
        assert_eq!(result.config.privileges["docker-socket"], "true");
    }
}
