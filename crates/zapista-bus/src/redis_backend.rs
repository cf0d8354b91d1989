//! Redis-backed outbound priority lanes.
//!
//! `publish_outbound` RPUSHes to `<ns>:outbound:{high|normal}`; a feeder
//! task BLPOPs both lanes — passing the high-priority key first so Redis
//! itself resolves priority order — and forwards whatever it pops into the
//! bus's local queue for dispatch.

use redis::aio::ConnectionManager;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zapista_core::message::OutboundMessage;

use crate::error::Result;

const BLPOP_TIMEOUT_SECS: f64 = 5.0;

pub struct RedisBackend {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisBackend {
    pub async fn connect(redis_url: &str, namespace: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            namespace: namespace.into(),
        })
    }

    pub fn connection_manager(&self) -> ConnectionManager {
        self.conn.clone()
    }

    fn key(&self, lane: &str) -> String {
        format!("{}:outbound:{lane}", self.namespace)
    }

    pub async fn push(&self, lane: &str, msg: &OutboundMessage) -> Result<()> {
        let payload = serde_json::to_string(msg)?;
        let mut conn = self.conn.clone();
        redis::cmd("RPUSH")
            .arg(self.key(lane))
            .arg(payload)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    /// Runs until cancelled. Pops from `high` then `normal` (BLPOP's
    /// multi-key form checks keys in the order given) and forwards each
    /// message into the matching local sender.
    pub async fn feed(
        self,
        high_tx: mpsc::UnboundedSender<OutboundMessage>,
        normal_tx: mpsc::UnboundedSender<OutboundMessage>,
    ) {
        info!("redis outbound feeder started");
        let high_key = self.key("high");
        let normal_key = self.key("normal");
        let mut conn = self.conn.clone();

        loop {
            let result: redis::RedisResult<Option<(String, String)>> = redis::cmd("BLPOP")
                .arg(&high_key)
                .arg(&normal_key)
                .arg(BLPOP_TIMEOUT_SECS)
                .query_async(&mut conn)
                .await;

            match result {
                Ok(Some((key, value))) => match serde_json::from_str::<OutboundMessage>(&value) {
                    Ok(msg) => {
                        let tx = if key == high_key { &high_tx } else { &normal_tx };
                        if tx.send(msg).is_err() {
                            warn!("local outbound channel closed; stopping redis feeder");
                            break;
                        }
                    }
                    Err(e) => warn!("dropping undecodable redis outbound payload: {e}"),
                },
                Ok(None) => continue, // BLPOP timeout, no message
                Err(e) => {
                    warn!("redis BLPOP failed: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
            debug!("redis feeder tick");
        }
    }
}
