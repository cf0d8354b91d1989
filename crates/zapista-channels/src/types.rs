use serde::{Deserialize, Serialize};

/// Runtime connection state of a channel adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Fully connected and ready to send/receive.
    Connected,

    /// Attempting to establish or re-establish the connection.
    Connecting,

    /// Cleanly disconnected (not an error condition).
    Disconnected,

    /// An unrecoverable (or pre-retry) error occurred.
    Error(String),
}

/// A frame received from the WhatsApp bridge over its WebSocket, tagged on
/// `type`. Field names match the bridge's wire protocol verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BridgeInboundFrame {
    Message {
        id: String,
        sender: String,
        #[serde(default)]
        pn: Option<String>,
        content: String,
        timestamp: i64,
        #[serde(default, rename = "isGroup")]
        is_group: bool,
        #[serde(default, rename = "mediaBase64")]
        media_base64: Option<String>,
        #[serde(default, rename = "audioTooLarge")]
        audio_too_large: bool,
        #[serde(default, rename = "audioForwarded")]
        audio_forwarded: bool,
        #[serde(default, rename = "attachmentIcs")]
        attachment_ics: Option<String>,
    },
    Reaction {
        #[serde(rename = "chatId")]
        chat_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
        emoji: String,
        #[serde(default, rename = "fromMe")]
        from_me: bool,
    },
    Sent {
        request_id: String,
        id: String,
        #[serde(default)]
        job_id: Option<String>,
    },
    Status {
        status: BridgeConnectionStatus,
    },
    Qr,
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeConnectionStatus {
    Connected,
    Disconnected,
}

/// The sole outgoing frame kind: a send request. `request_id` lets us
/// correlate the bridge's later `sent` frame back to this send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BridgeSendFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub to: &'a str,
    pub text: &'a str,
    pub request_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<&'a str>,
}

impl<'a> BridgeSendFrame<'a> {
    pub fn new(to: &'a str, text: &'a str, request_id: &'a str, job_id: Option<&'a str>) -> Self {
        Self {
            kind: "send",
            to,
            text,
            request_id,
            job_id,
        }
    }
}

/// Emoji reaction classes the bridge handler cares about. Anything else is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionClass {
    Positive,
    Snooze,
    Negative,
}

const POSITIVE_EMOJI: &[&str] = &["👍", "✅", "👌", "🎉"];
const SNOOZE_EMOJI: &[&str] = &["⏰", "🔔"];
const NEGATIVE_EMOJI: &[&str] = &["👎", "❌"];

impl ReactionClass {
    pub fn classify(emoji: &str) -> Option<Self> {
        if POSITIVE_EMOJI.contains(&emoji) {
            Some(ReactionClass::Positive)
        } else if SNOOZE_EMOJI.contains(&emoji) {
            Some(ReactionClass::Snooze)
        } else if NEGATIVE_EMOJI.contains(&emoji) {
            Some(ReactionClass::Negative)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_emoji() {
        assert_eq!(ReactionClass::classify("👍"), Some(ReactionClass::Positive));
        assert_eq!(ReactionClass::classify("⏰"), Some(ReactionClass::Snooze));
        assert_eq!(ReactionClass::classify("❌"), Some(ReactionClass::Negative));
        assert_eq!(ReactionClass::classify("🙂"), None);
    }

    #[test]
    fn deserializes_message_frame() {
        let raw = r#"{"type":"message","id":"m1","sender":"5511999@s.whatsapp.net","content":"oi","timestamp":1700000000,"isGroup":false}"#;
        let frame: BridgeInboundFrame = serde_json::from_str(raw).unwrap();
        match frame {
            BridgeInboundFrame::Message { id, content, .. } => {
                assert_eq!(id, "m1");
                assert_eq!(content, "oi");
            }
            _ => panic!("wrong variant"),
        }
    }
}
