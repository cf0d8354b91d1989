use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler '{handler}' failed: {reason}")]
    Failed { handler: String, reason: String },
}

pub type Result<T> = std::result::Result<T, HandlerError>;
