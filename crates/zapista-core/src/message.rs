//! Bus message shapes shared between `zapista-bus`, `zapista-channels` and
//! `zapista-agent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TraceId;

/// Delivery priority for an [`OutboundMessage`]. Cron deliveries are
/// `High`; ordinary agent replies are `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// Channel-specific metadata carried alongside an [`InboundMessage`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InboundMetadata {
    /// Used for dedup and for correlating a later `sent`/`reaction` frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Invariant: always `false` — this system serves private chats only.
    #[serde(default)]
    pub is_group: bool,
    pub trace_id: TraceId,
}

/// A message received from a channel adapter. Constructed once by the
/// channel, consumed once by the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: String,
    pub sender_id: String,
    pub chat_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub media: Vec<String>,
    pub metadata: InboundMetadata,
}

impl InboundMessage {
    /// `channel:chat_id` — the session key this message belongs to.
    pub fn session_key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

/// Metadata carried alongside an [`OutboundMessage`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutboundMetadata {
    #[serde(default)]
    pub priority: Priority,
    /// Set when this delivery originates from a fired cron job, so the
    /// channel adapter can record a (message_id, job_id) mapping once the
    /// bridge acks the send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

/// A message produced by the agent or the scheduler, to be delivered by a
/// channel adapter. Exactly one delivery attempt per consume; the bus
/// dedupes repeats of the same (channel, chat_id, content) within a short
/// window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub metadata: OutboundMetadata,
}

impl OutboundMessage {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
            media: Vec::new(),
            metadata: OutboundMetadata::default(),
        }
    }

    pub fn high_priority(mut self) -> Self {
        self.metadata.priority = Priority::High;
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.metadata.job_id = Some(job_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_channel_colon_chat_id() {
        let msg = InboundMessage {
            channel: "whatsapp".into(),
            sender_id: "x".into(),
            chat_id: "5511999998888".into(),
            content: "oi".into(),
            timestamp: Utc::now(),
            media: vec![],
            metadata: InboundMetadata::default(),
        };
        assert_eq!(msg.session_key(), "whatsapp:5511999998888");
    }

    #[test]
    fn outbound_builder_sets_priority_and_job_id() {
        let msg = OutboundMessage::new("whatsapp", "555", "lembrete")
            .high_priority()
            .with_job_id("RM01");
        assert_eq!(msg.metadata.priority, Priority::High);
        assert_eq!(msg.metadata.job_id.as_deref(), Some("RM01"));
    }
}
