// src/utils/error.rs
use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the mining application
///
/// Covers configuration, job feed, submission transport and hash primitive
/// failures. A rejected submission is not an error; see
/// [`SubmitOutcome`](crate::network::submit::SubmitOutcome).
#[derive(Error, Debug)]
pub enum MinerError {
    /// Configuration file or parameter errors, including hash parameters
    /// changed after they were frozen
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The job feed supplied a job hash that is not 32 bytes of hex
    #[error("Invalid job hash: {0}")]
    InvalidJobHash(String),

    /// Submission or getWork transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The keyed hash primitive reported an internal failure
    #[error("Hash computation error: {0}")]
    HashComputationError(String),

    /// Errors in protocol handling or invalid protocol messages
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// The worker pool was started twice without an intervening stop
    #[error("Worker pool is already running")]
    AlreadyRunning,

    /// The worker pool was stopped without running
    #[error("Worker pool is not running")]
    NotRunning,

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts hex decoding errors into MinerError
///
/// Hex only reaches us through job hashes and targets published by the
/// node, so a decoding failure is reported as a malformed job.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InvalidJobHash(format!("Hex conversion failed: {}", e))
    }
}

/// Converts async task join errors into MinerError
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}

impl MinerError {
    /// True for errors that must take the whole process down
    pub fn is_fatal(&self) -> bool {
        matches!(self, MinerError::ConfigError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_errors_become_invalid_job_hash() {
        let err: MinerError = hex::decode("zz").unwrap_err().into();
        assert!(
            matches!(err, MinerError::InvalidJobHash(_)),
            "bad hex must surface as InvalidJobHash, got {err:?}"
        );
    }

    #[test]
    fn only_config_errors_are_fatal() {
        assert!(MinerError::ConfigError("frozen".into()).is_fatal());
        assert!(!MinerError::NetworkError("timeout".into()).is_fatal());
        assert!(!MinerError::HashComputationError("argon2".into()).is_fatal());
    }
}
