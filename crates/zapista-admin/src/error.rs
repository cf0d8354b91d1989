use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("malformed admin store: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, AdminError>;
