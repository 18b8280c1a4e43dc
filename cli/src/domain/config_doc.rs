//! Driver config documents built by dotted-path assignment.
//!
//! Keys serialize sorted, so a document built from the same directives is
//! byte-identical across runs.

use serde_json::{Map, Value};

use crate::domain::error::ConfigPathError;

/// A JSON object tree addressed by `a.b.c` paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDoc {
    root: Map<String, Value>,
}

impl ConfigDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`, creating intermediate objects.
    ///
    /// Replacing an object with a scalar, or descending through a scalar,
    /// is a conflict.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConfigPathError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ConfigPathError::Empty);
        }
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigPathError::EmptySegment {
                path: path.to_string(),
            });
        }

        let conflict = |i: usize| ConfigPathError::Conflict {
            path: path.to_string(),
            at: parts[..=i].join("."),
        };

        let (last, parents) = parts.split_last().ok_or(ConfigPathError::Empty)?;
        let mut current = &mut self.root;
        for (i, part) in parents.iter().enumerate() {
            let next = current
                .entry((*part).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match next {
                Value::Object(map) => map,
                _ => return Err(conflict(i)),
            };
        }
        if matches!(current.get(*last), Some(Value::Object(_))) {
            return Err(conflict(parents.len()));
        }
        current.insert((*last).to_string(), value.into());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Two-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}

/// A CONFIGURE value: JSON when it parses, the raw text otherwise.
#[must_use]
pub fn configure_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Split `<runtime> config set <path> <value...>` into path and typed value.
///
/// Returns `None` for any other shape, including a wrong runtime prefix or
/// an empty value.
#[must_use]
pub fn parse_config_set(runtime: &str, command: &str) -> Option<(String, Value)> {
    split_config_set(runtime, command).map(|(path, raw)| (path.to_string(), configure_value(raw)))
}

/// Path and raw value text of `<runtime> config set <path> <value...>`.
///
/// The value is everything after the path with only its outer whitespace
/// trimmed.
#[must_use]
pub fn split_config_set<'a>(runtime: &str, command: &'a str) -> Option<(&'a str, &'a str)> {
    let (bin, rest) = next_word(command)?;
    let (verb, rest) = next_word(rest)?;
    let (action, rest) = next_word(rest)?;
    let (path, rest) = next_word(rest)?;
    let value = rest.trim();
    (bin == runtime && verb == "config" && action == "set" && !value.is_empty())
        .then_some((path, value))
}

fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}
