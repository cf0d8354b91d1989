use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Session key: `channel:chat_id`. Sessions belong to a private chat, never
/// to a user across channels — memory must stay strictly per-chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub channel: String,
    pub chat_id: String,
}

impl SessionKey {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Canonical wire-format string: `channel:chat_id`. `chat_id` may itself
    /// contain colons (WhatsApp JIDs do), so only the first colon separates.
    pub fn format(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let colon_pos = s
            .find(':')
            .ok_or_else(|| SessionError::InvalidKey(format!("missing ':' separator: {s}")))?;
        let channel = &s[..colon_pos];
        let chat_id = &s[colon_pos + 1..];
        if channel.is_empty() || chat_id.is_empty() {
            return Err(SessionError::InvalidKey(format!(
                "key components must not be empty: {s}"
            )));
        }
        Ok(Self {
            channel: channel.to_string(),
            chat_id: chat_id.to_string(),
        })
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// A single turn in the conversation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// A persisted, per-chat conversation session. Lazily created on first
/// message; history is capped to the most recent `HISTORY_WINDOW` messages
/// on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub message_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_simple_key() {
        let key = SessionKey::new("whatsapp", "5511999998888");
        let s = key.format();
        assert_eq!(s, "whatsapp:5511999998888");
        let parsed = SessionKey::parse(&s).expect("parse failed");
        assert_eq!(parsed, key);
    }

    #[test]
    fn roundtrip_chat_id_with_colon() {
        let key = SessionKey::new("whatsapp", "5511999998888:12@s.whatsapp.net");
        let s = key.format();
        let parsed = SessionKey::parse(&s).expect("parse failed");
        assert_eq!(parsed.chat_id, "5511999998888:12@s.whatsapp.net");
    }

    #[test]
    fn parse_missing_separator_returns_err() {
        assert!(SessionKey::parse("whatsapp-5511999998888").is_err());
    }
}
