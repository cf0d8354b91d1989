use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The requested session does not exist in the database.
    #[error("session not found: {key}")]
    NotFound { key: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The provided session key string is malformed.
    ///
    /// Expected format: `channel:chat_id`
    #[error("invalid session key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
