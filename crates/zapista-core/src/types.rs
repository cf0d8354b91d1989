use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-turn correlation token, assigned at inbound reception and
/// propagated through every log line and downstream call for that turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(pub String);

impl TraceId {
    /// 12-character trace id, per the design notes.
    pub fn new() -> Self {
        let full = Uuid::new_v4().simple().to_string();
        Self(full[..12].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the (channel, chat_id) pair that owns a resource: a job, a
/// session, a rate bucket. The sole kind of chat this system serves is a
/// private one-to-one chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub channel: String,
    pub chat_id: String,
}

impl Owner {
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Session-key / dedup-key style string: `channel:chat_id`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.channel, self.chat_id)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Supported locales, in deterministic fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "pt-PT")]
    PtPt,
    Es,
    #[default]
    En,
}

impl Locale {
    /// Deterministic fallback: explicit override > phone-prefix default > en.
    pub fn from_phone_prefix(prefix: &str) -> Self {
        match prefix {
            "55" => Locale::PtBr,
            "351" => Locale::PtPt,
            "34" | "52" | "54" | "57" | "56" | "51" => Locale::Es,
            _ => Locale::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::PtPt => "pt-PT",
            Locale::Es => "es",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_is_twelve_chars() {
        let id = TraceId::new();
        assert_eq!(id.as_str().len(), 12);
    }

    #[test]
    fn owner_key_format() {
        let o = Owner::new("whatsapp", "5511999998888");
        assert_eq!(o.key(), "whatsapp:5511999998888");
    }

    #[test]
    fn locale_fallback_by_prefix() {
        assert_eq!(Locale::from_phone_prefix("55"), Locale::PtBr);
        assert_eq!(Locale::from_phone_prefix("999"), Locale::En);
    }
}
