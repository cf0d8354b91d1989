use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZapistaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ZapistaError {
    /// Short error code string usable in logs and admin replies.
    pub fn code(&self) -> &'static str {
        match self {
            ZapistaError::Config(_) => "CONFIG_ERROR",
            ZapistaError::AuthFailed(_) => "AUTH_FAILED",
            ZapistaError::PermissionDenied { .. } => "PERMISSION_DENIED",
            ZapistaError::UserNotFound { .. } => "USER_NOT_FOUND",
            ZapistaError::Database(_) => "DATABASE_ERROR",
            ZapistaError::Channel { .. } => "CHANNEL_ERROR",
            ZapistaError::Serialization(_) => "SERIALIZATION_ERROR",
            ZapistaError::Io(_) => "IO_ERROR",
            ZapistaError::Timeout { .. } => "TIMEOUT",
            ZapistaError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ZapistaError>;
