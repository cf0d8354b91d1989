use thiserror::Error;

/// Errors that can occur within the message bus. Redis failures are never
/// surfaced to publishers — they fall back to the local queue and are only
/// logged — so this type is mostly useful for the feeder task's own
/// diagnostics.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BusError>;
