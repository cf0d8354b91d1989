//! Dependencies the bridge client needs but does not own. The daemon wires
//! concrete implementations (user store, admin state machine, scheduler,
//! provider clients) in; this crate only depends on their shapes.

use async_trait::async_trait;

/// Allow-list and mute checks. Backed by the user store in practice.
pub trait AccessControl: Send + Sync {
    /// Union of static config and runtime-added numbers.
    fn is_allowed(&self, chat_id: &str) -> bool;
    /// True while any mute-ladder level is active for this chat.
    fn is_muted(&self, chat_id: &str) -> bool;
}

/// Entry point into the admin ("God Mode") pipeline for `#`-prefixed input.
#[async_trait]
pub trait AdminPipeline: Send + Sync {
    /// Returns the reply to send, if any — silence is a valid outcome (a
    /// wrong password in the unactivated state, or while locked out).
    async fn handle(&self, chat_id: &str, content: &str) -> Option<String>;
}

/// Speech-to-text for `[Voice Message]` frames carrying `media_base64`.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, media_base64: &str) -> Result<String, String>;
}

/// Parses an ICS calendar payload and creates one reminder per event.
#[async_trait]
pub trait IcsImporter: Send + Sync {
    /// Returns a human-readable summary reply on success.
    async fn import(&self, channel: &str, chat_id: &str, ics_base64: &str) -> Result<String, String>;
}

/// Injected so `/restart`'s second confirmation can actually act.
#[async_trait]
pub trait RestartExecutor: Send + Sync {
    async fn restart(&self);
}
