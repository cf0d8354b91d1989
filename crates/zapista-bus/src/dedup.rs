//! Dedup maps with TTL.
//!
//! Inbound dedup picks one backend deterministically — Redis when
//! configured, otherwise an in-memory map — never both at once. Outbound
//! dedup is always in-memory: it only needs to suppress a same-process
//! double-send within a short window.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::warn;

const REDIS_INBOUND_TTL_SECS: u64 = 86_400;
const MEMORY_INBOUND_TTL: Duration = Duration::from_secs(120);
const CONTENT_BUCKET_WINDOW_SECS: i64 = 30;
const OUTBOUND_DEDUP_WINDOW: Duration = Duration::from_secs(90);

/// Opportunistically purges expired entries on lookup. O(n) periodic
/// purges are acceptable at the message rates this system sees.
struct TtlMap {
    entries: DashMap<String, Instant>,
}

impl TtlMap {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns `true` if `key` was already present and unexpired (a
    /// duplicate); otherwise records it and returns `false`.
    fn check_and_mark(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        if let Some(existing) = self.entries.get(key) {
            if now.duration_since(*existing.value()) < ttl {
                return true;
            }
        }
        self.entries.insert(key.to_string(), now);
        self.purge(ttl);
        false
    }

    fn purge(&self, ttl: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, inserted_at| now.duration_since(*inserted_at) < ttl);
    }
}

/// Inbound dedup, chosen once at bus construction: Redis when `REDIS_URL`
/// is set, otherwise an in-memory TTL map. Never both.
pub enum InboundDedup {
    Redis {
        conn: redis::aio::ConnectionManager,
        namespace: String,
    },
    Memory(TtlMap),
}

impl InboundDedup {
    pub fn memory() -> Self {
        InboundDedup::Memory(TtlMap::new())
    }

    pub fn redis(conn: redis::aio::ConnectionManager, namespace: impl Into<String>) -> Self {
        InboundDedup::Redis {
            conn,
            namespace: namespace.into(),
        }
    }

    /// `message_id` present: dedup by id (86400s in Redis, 120s in memory).
    /// Absent: fall back to a 30-second content bucket keyed on
    /// `(chat_id, trimmed content, epoch/30)`.
    pub async fn is_duplicate(&self, chat_id: &str, content: &str, message_id: Option<&str>) -> bool {
        let key = match message_id {
            Some(id) if !id.is_empty() => format!("msg:{id}"),
            _ => {
                let bucket = chrono::Utc::now().timestamp() / CONTENT_BUCKET_WINDOW_SECS;
                format!("content:{chat_id}:{}:{bucket}", content.trim())
            }
        };

        match self {
            InboundDedup::Memory(map) => map.check_and_mark(&key, MEMORY_INBOUND_TTL),
            InboundDedup::Redis { conn, namespace } => {
                let mut conn = conn.clone();
                let redis_key = format!("{namespace}:dedup:{key}");
                let set: redis::RedisResult<bool> = redis::cmd("SET")
                    .arg(&redis_key)
                    .arg("1")
                    .arg("NX")
                    .arg("EX")
                    .arg(REDIS_INBOUND_TTL_SECS)
                    .query_async(&mut conn)
                    .await
                    .map(|v: Option<String>| v.is_none());
                match set {
                    // SET NX returned nil (key already existed) => duplicate.
                    Ok(already_set) => already_set,
                    Err(e) => {
                        warn!("redis dedup SET failed, treating as not-duplicate: {e}");
                        false
                    }
                }
            }
        }
    }
}

/// Outbound dedup: `(channel, chat_id, sha256(content)[:16])` over a
/// 90-second window, so a repeat delivery to the same recipient is
/// suppressed without affecting any other recipient.
pub struct OutboundDedup {
    map: TtlMap,
}

impl OutboundDedup {
    pub fn new() -> Self {
        Self { map: TtlMap::new() }
    }

    pub fn is_duplicate(&self, channel: &str, chat_id: &str, content: &str) -> bool {
        let hash = hex::encode(Sha256::digest(content.as_bytes()));
        let key = format!("{channel}:{chat_id}:{}", &hash[..16]);
        self.map.check_and_mark(&key, OUTBOUND_DEDUP_WINDOW)
    }
}

impl Default for OutboundDedup {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_dedup_suppresses_repeat_message_id() {
        let dedup = InboundDedup::memory();
        assert!(!dedup.is_duplicate("555", "oi", Some("abc")).await);
        assert!(dedup.is_duplicate("555", "oi", Some("abc")).await);
    }

    #[tokio::test]
    async fn content_bucket_used_when_no_message_id() {
        let dedup = InboundDedup::memory();
        assert!(!dedup.is_duplicate("555", "  oi  ", None).await);
        // Same trimmed content, same chat, same 30s bucket => duplicate.
        assert!(dedup.is_duplicate("555", "oi", None).await);
        // Different chat_id is never a duplicate of another chat's content.
        assert!(!dedup.is_duplicate("666", "oi", None).await);
    }

    #[test]
    fn outbound_dedup_is_scoped_per_recipient() {
        let dedup = OutboundDedup::new();
        assert!(!dedup.is_duplicate("whatsapp", "555", "lembrete"));
        assert!(dedup.is_duplicate("whatsapp", "555", "lembrete"));
        assert!(!dedup.is_duplicate("whatsapp", "666", "lembrete"));
    }
}
