//! openclaw scheduled jobs (`state/cron/jobs.json`).
//!
//! Job IDs hash service, schedule and message, so the same invocation
//! keeps its ID across runs. Timestamps and run state of a job already
//! present in the file are carried over; new jobs start at zero. A rerun
//! with unchanged invocations therefore rewrites an identical file.

use std::collections::HashMap;

use claw_common::Invocation;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::runtime::tokens::hex_encode;

const NAME_LIMIT: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub agent_id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub schedule: JobSchedule,
    pub session_target: String,
    pub wake_mode: String,
    pub payload: JobPayload,
    pub delivery: JobDelivery,
    #[serde(default)]
    pub state: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSchedule {
    pub expr: String,
    pub tz: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub kind: String,
    pub message: String,
    pub timeout_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDelivery {
    pub mode: String,
    pub best_effort: bool,
    /// Omitted so openclaw delivers to the last active channel.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    #[serde(default)]
    pub next_run_at_ms: i64,
    #[serde(default)]
    pub last_run_at_ms: i64,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_duration_ms: i64,
    #[serde(default)]
    pub consecutive_errors: u32,
}

/// UUID-shaped ID from `sha256(service|schedule|message)`.
#[must_use]
pub fn job_id(service: &str, schedule: &str, message: &str) -> String {
    let digest = Sha256::digest(format!("{service}|{schedule}|{message}").as_bytes());
    format!(
        "{}-{}-{}-{}-{}",
        hex_encode(&digest[0..4]),
        hex_encode(&digest[4..6]),
        hex_encode(&digest[6..8]),
        hex_encode(&digest[8..10]),
        hex_encode(&digest[10..16]),
    )
}

/// Jobs for `invocations`, reusing timestamps and state from `existing`.
#[must_use]
pub fn build_jobs(service: &str, invocations: &[Invocation], existing: &[Job]) -> Vec<Job> {
    let previous: HashMap<&str, &Job> = existing.iter().map(|j| (j.id.as_str(), j)).collect();
    invocations
        .iter()
        .map(|inv| {
            let id = job_id(service, &inv.schedule, &inv.message);
            let name = if inv.name.is_empty() {
                truncate(&inv.message, NAME_LIMIT)
            } else {
                inv.name.clone()
            };
            let (created, updated, state) = previous.get(id.as_str()).map_or_else(
                || (0, 0, JobState::default()),
                |p| (p.created_at_ms, p.updated_at_ms, p.state.clone()),
            );
            Job {
                id,
                agent_id: "main".to_string(),
                name,
                enabled: true,
                created_at_ms: created,
                updated_at_ms: updated,
                schedule: JobSchedule {
                    expr: inv.schedule.clone(),
                    tz: "UTC".to_string(),
                    kind: "cron".to_string(),
                },
                session_target: "isolated".to_string(),
                wake_mode: "now".to_string(),
                payload: JobPayload {
                    kind: "agentTurn".to_string(),
                    message: inv.message.clone(),
                    timeout_seconds: 300,
                },
                delivery: JobDelivery {
                    mode: "announce".to_string(),
                    best_effort: true,
                    to: inv.to.clone(),
                },
                state,
            }
        })
        .collect()
}

/// Parse an existing jobs file; anything unreadable counts as empty.
#[must_use]
pub fn parse_jobs(content: &str) -> Vec<Job> {
    serde_json::from_str(content).unwrap_or_default()
}

/// Truncate to at most `limit` bytes on a char boundary.
fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
