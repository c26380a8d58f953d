use thiserror::Error;

use crate::ids::QueueId;

/// Errors reported by queue and enqueue operations.
///
/// Every operation that returns one of these leaves the scheduler exactly as
/// it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("queue {0} does not exist")]
    NotFound(QueueId),

    #[error("queue {0} is locked and refuses new tasks")]
    Locked(QueueId),

    #[error("operation unavailable on queue {0}")]
    Unavailable(QueueId),
}

/// Errors raised while loading or validating a [`SchedulerConfig`](crate::SchedulerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
