use thiserror::Error;

/// Failures of the event log and its storage backend.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The log worker task is gone; nothing more can be appended or read.
    #[error("event log worker stopped")]
    Closed,
}

#[derive(Error, Debug)]
pub enum RelayError {
    /// The relay actor has shut down and no longer accepts commands.
    #[error("relay stopped")]
    Closed,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Log(#[from] LogError),
}
