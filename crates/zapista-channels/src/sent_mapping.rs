//! Correlates an outgoing `send`'s `request_id` with the bridge's `sent`
//! ack, and remembers `(chat_id, bridge_message_id) -> job_id` so a later
//! `reaction` frame can find the job it's reacting to.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;

pub const PENDING_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// What the bridge reports once it has actually sent the message.
pub struct SentAck {
    pub bridge_message_id: String,
    pub job_id: Option<String>,
}

/// Requests awaiting a `sent` frame, keyed by `request_id`. Entries that
/// never resolve within [`PENDING_SEND_TIMEOUT`] are cleared by the waiting
/// side's own timeout, not by this map — it never needs to scan for
/// staleness.
#[derive(Default)]
pub struct PendingSends {
    entries: DashMap<String, oneshot::Sender<SentAck>>,
}

impl PendingSends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, request_id: impl Into<String>) -> oneshot::Receiver<SentAck> {
        let (tx, rx) = oneshot::channel();
        self.entries.insert(request_id.into(), tx);
        rx
    }

    /// Called on a `sent` frame. A missing entry means the send already
    /// timed out and was dropped by the waiter; that's fine, just ignore it.
    pub fn resolve(&self, request_id: &str, ack: SentAck) {
        if let Some((_, tx)) = self.entries.remove(request_id) {
            let _ = tx.send(ack);
        }
    }

    pub fn cancel(&self, request_id: &str) {
        self.entries.remove(request_id);
    }
}

/// consume-once `(chat_id, bridge_message_id) -> job_id` lookup for reaction
/// correlation.
#[derive(Default)]
pub struct SentMapping {
    entries: DashMap<(String, String), String>,
}

impl SentMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, chat_id: &str, bridge_message_id: &str, job_id: String) {
        self.entries
            .insert((chat_id.to_string(), bridge_message_id.to_string()), job_id);
    }

    /// Consume-once: present means there's exactly one outstanding reaction
    /// opportunity for this delivered message.
    pub fn take(&self, chat_id: &str, bridge_message_id: &str) -> Option<String> {
        self.entries
            .remove(&(chat_id.to_string(), bridge_message_id.to_string()))
            .map(|(_, job_id)| job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_send_resolves_through_sent_frame() {
        let pending = PendingSends::new();
        let rx = pending.register("req1");
        pending.resolve(
            "req1",
            SentAck {
                bridge_message_id: "bm1".into(),
                job_id: Some("RM01".into()),
            },
        );
        let ack = rx.await.unwrap();
        assert_eq!(ack.bridge_message_id, "bm1");
        assert_eq!(ack.job_id.as_deref(), Some("RM01"));
    }

    #[test]
    fn sent_mapping_is_consume_once() {
        let mapping = SentMapping::new();
        mapping.record("555", "bm1", "RM01".into());
        assert_eq!(mapping.take("555", "bm1"), Some("RM01".to_string()));
        assert_eq!(mapping.take("555", "bm1"), None);
    }
}
