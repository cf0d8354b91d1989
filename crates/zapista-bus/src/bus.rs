use tokio::sync::{mpsc, Mutex};
use tracing::warn;
use zapista_core::message::{InboundMessage, OutboundMessage, Priority};

use crate::dedup::{InboundDedup, OutboundDedup};
use crate::redis_backend::RedisBackend;

/// Decouples chat channels from the agent core. Inbound has a single
/// consumer (the agent loop); outbound has two priority lanes, each with
/// potentially multiple consumers (one per channel adapter).
///
/// When `redis_url` is configured, outbound publishes RPUSH into
/// `<ns>:outbound:{high,normal}` and a background feeder BLPOPs both lanes
/// in priority order into these same local channels — so `consume_outbound`
/// never needs to know whether Redis is in the loop.
pub struct MessageBus {
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<InboundMessage>>,

    outbound_tx_high: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx_high: Mutex<mpsc::UnboundedReceiver<OutboundMessage>>,
    outbound_tx_normal: mpsc::UnboundedSender<OutboundMessage>,
    outbound_rx_normal: Mutex<mpsc::UnboundedReceiver<OutboundMessage>>,

    redis: Option<RedisBackend>,
    inbound_dedup: InboundDedup,
    outbound_dedup: OutboundDedup,
}

impl MessageBus {
    /// Build an in-memory-only bus. Use [`Self::with_redis`] to attach a
    /// durable outbound backend.
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx_high, outbound_rx_high) = mpsc::unbounded_channel();
        let (outbound_tx_normal, outbound_rx_normal) = mpsc::unbounded_channel();

        Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx_high,
            outbound_rx_high: Mutex::new(outbound_rx_high),
            outbound_tx_normal,
            outbound_rx_normal: Mutex::new(outbound_rx_normal),
            redis: None,
            inbound_dedup: InboundDedup::memory(),
            outbound_dedup: OutboundDedup::new(),
        }
    }

    /// Attach a Redis-backed outbound store and switch inbound dedup to
    /// Redis too (per the spec's single-backend rule — never both). Spawns
    /// the feeder task that drains Redis into the local outbound channels.
    pub async fn with_redis(redis_url: &str, namespace: &str) -> crate::error::Result<Self> {
        let mut bus = Self::new();
        let publisher = RedisBackend::connect(redis_url, namespace).await?;
        let feeder = RedisBackend::connect(redis_url, namespace).await?;
        bus.inbound_dedup = InboundDedup::redis(publisher.connection_manager(), namespace);

        let high_tx = bus.outbound_tx_high.clone();
        let normal_tx = bus.outbound_tx_normal.clone();
        tokio::spawn(async move { feeder.feed(high_tx, normal_tx).await });

        bus.redis = Some(publisher);
        Ok(bus)
    }

    /// Dedup check for an inbound message, by `id` when present (Redis or
    /// in-memory, whichever backend this bus was built with) or by content
    /// bucket otherwise. This marks the key as seen, so it must run exactly
    /// once per message — channel adapters call it first, before any other
    /// processing (admin commands, STT, …), so a duplicate short-circuits
    /// the whole turn rather than just the final publish.
    pub async fn is_duplicate_inbound(&self, chat_id: &str, content: &str, message_id: Option<&str>) -> bool {
        self.inbound_dedup.is_duplicate(chat_id, content, message_id).await
    }

    /// Enqueue an inbound message. Callers are expected to have already
    /// resolved dedup via [`Self::is_duplicate_inbound`].
    pub fn publish_inbound(&self, msg: InboundMessage) {
        // An unbounded channel send only fails if every receiver has been
        // dropped, i.e. the bus is shutting down.
        let _ = self.inbound_tx.send(msg);
    }

    /// Blocks until an inbound message is available. Single logical
    /// consumer: the agent loop.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Route by `metadata.priority`. Falls back to the local queue on any
    /// Redis error — the bus never raises to callers.
    pub async fn publish_outbound(&self, msg: OutboundMessage) {
        if self
            .outbound_dedup
            .is_duplicate(&msg.channel, &msg.chat_id, &msg.content)
        {
            return;
        }

        if let Some(redis) = &self.redis {
            let lane = match msg.metadata.priority {
                Priority::High => "high",
                Priority::Normal => "normal",
            };
            if let Err(e) = redis.push(lane, &msg).await {
                warn!("redis outbound push failed, falling back to local queue: {e}");
                self.enqueue_local(msg);
            }
            return;
        }

        self.enqueue_local(msg);
    }

    fn enqueue_local(&self, msg: OutboundMessage) {
        let tx = match msg.metadata.priority {
            Priority::High => &self.outbound_tx_high,
            Priority::Normal => &self.outbound_tx_normal,
        };
        let _ = tx.send(msg);
    }

    /// Blocks until an outbound message is available, preferring the high
    /// priority lane whenever both have one ready.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        let mut high = self.outbound_rx_high.lock().await;
        let mut normal = self.outbound_rx_normal.lock().await;
        tokio::select! {
            biased;
            msg = high.recv() => msg,
            msg = normal.recv() => msg,
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zapista_core::types::TraceId;

    fn inbound(chat_id: &str, content: &str, message_id: Option<&str>) -> InboundMessage {
        InboundMessage {
            channel: "whatsapp".into(),
            sender_id: chat_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: chrono::Utc::now(),
            media: vec![],
            metadata: zapista_core::message::InboundMetadata {
                message_id: message_id.map(String::from),
                is_group: false,
                trace_id: TraceId::new(),
            },
        }
    }

    #[tokio::test]
    async fn inbound_dedup_drops_repeat_message_id() {
        let bus = MessageBus::new();
        assert!(!bus.is_duplicate_inbound("555", "oi", Some("m1")).await);
        bus.publish_inbound(inbound("555", "oi", Some("m1")));

        // Second arrival with the same message id is a duplicate; the
        // caller is expected to stop before ever calling publish_inbound.
        assert!(bus.is_duplicate_inbound("555", "oi outra vez", Some("m1")).await);

        let first = bus.consume_inbound().await.unwrap();
        assert_eq!(first.content, "oi");

        // A distinct message id proves the queue is still alive.
        assert!(!bus.is_duplicate_inbound("555", "novo", Some("m2")).await);
        bus.publish_inbound(inbound("555", "novo", Some("m2")));
        let second = bus.consume_inbound().await.unwrap();
        assert_eq!(second.content, "novo");
    }

    #[tokio::test]
    async fn outbound_prefers_high_priority_lane() {
        let bus = MessageBus::new();
        bus.publish_outbound(OutboundMessage::new("whatsapp", "555", "normal reply"))
            .await;
        bus.publish_outbound(
            OutboundMessage::new("whatsapp", "555", "lembrete urgente").high_priority(),
        )
        .await;

        let first = bus.consume_outbound().await.unwrap();
        assert_eq!(first.content, "lembrete urgente");
        let second = bus.consume_outbound().await.unwrap();
        assert_eq!(second.content, "normal reply");
    }
}
