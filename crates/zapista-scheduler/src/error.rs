use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The durable job store could not be read or written.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job store file is not valid JSON, or a job failed to (de)serialize.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The provided schedule definition is invalid or unsupported.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// No job with the given ID exists in the store.
    #[error("job not found: {id}")]
    JobNotFound { id: String },

    /// The caller's owner does not match the job's owner.
    #[error("job {id} does not belong to the requesting owner")]
    ForeignJob { id: String },

    /// A cron expression could not be parsed or has no future occurrence.
    #[error("cron expression error: {0}")]
    InvalidCron(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
