//! Cron job payload/state types — shared between `zapista-scheduler`,
//! `zapista-agent` (the `reminder` tool) and the channel adapters that
//! eventually deliver a fired job.

use serde::{Deserialize, Serialize};

/// What a fired job actually does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronPayloadKind {
    /// Synthesize an agent turn addressed to the job's owner.
    AgentTurn,
    /// A deterministic system notification — no LLM involvement.
    SystemEvent,
}

/// Stored as the `action` field of a `CronJob`. Created by the reminder tool
/// or by the ICS-attachment import flow; read by the scheduler's `on_job`
/// callback when the job becomes due.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronPayload {
    pub kind: CronPayloadKind,
    pub message: String,
    pub deliver: bool,
    pub target_channel: String,
    pub target_chat_id: String,
    /// Links pre-event/snooze derivative jobs back to their primary job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<String>,
}

impl CronPayload {
    pub fn agent_turn(message: impl Into<String>, channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            kind: CronPayloadKind::AgentTurn,
            message: message.into(),
            deliver: true,
            target_channel: channel.into(),
            target_chat_id: chat_id.into(),
            parent_job_id: None,
        }
    }
}

/// Last-status outcome of a job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronRunStatus {
    Ok,
    Error,
}

/// Mutable run state of a `CronJob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJobState {
    /// `None` when the job is disabled (e.g. a failed one-shot).
    pub next_run_at_ms: Option<i64>,
    pub last_run_at_ms: Option<i64>,
    pub last_status: Option<CronRunStatus>,
    pub last_error: Option<String>,
    pub snooze_count: u32,
}

impl Default for CronJobState {
    fn default() -> Self {
        Self {
            next_run_at_ms: None,
            last_run_at_ms: None,
            last_status: None,
            last_error: None,
            snooze_count: 0,
        }
    }
}
