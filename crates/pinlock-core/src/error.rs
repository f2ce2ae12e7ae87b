//! Error types for the passcode lock

use thiserror::Error;

/// Result type alias for lock construction
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors raised when building a lock
#[derive(Debug, Error)]
pub enum LockError {
    /// Configuration rejected
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Passcode parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasscodeError {
    #[error("Passcode must not be empty")]
    Empty,

    #[error("Passcode must contain only digits (found {0:?})")]
    NonDigit(char),
}

/// Passcode storage errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Hashing error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Stored record is unreadable
    #[error("Stored passcode is corrupted: {0}")]
    Corrupted(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::Serialization(e.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Passcode length must be between 1 and {max} (got {0})",
        max = crate::config::MAX_PASSCODE_LENGTH
    )]
    InvalidPasscodeLength(usize),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
