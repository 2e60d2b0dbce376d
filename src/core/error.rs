//! Error types for slogate.

use thiserror::Error;

/// Result type alias for slogate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in slogate operations.
#[derive(Error, Debug)]
pub enum Error {
    // Indicator errors
    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("indicator already registered: {0}")]
    DuplicateIndicator(String),

    #[error("invalid indicator slug: {0}")]
    InvalidSlug(String),

    #[error("indicator is immutable once events reference it: {0}")]
    ImmutableIndicator(String),

    // Recording errors
    #[error("invalid count: {0}")]
    InvalidCount(String),

    #[error("wrong indicator kind: {0}")]
    WrongIndicatorKind(String),

    // SLO errors
    #[error("unknown SLO: {0}")]
    UnknownSlo(String),

    #[error("SLO already registered: {0}")]
    DuplicateSlo(String),

    #[error("SLO is not active: {0}")]
    InactiveSlo(String),

    #[error("no active SLO bound to indicator: {0}")]
    NoActiveSlo(String),

    #[error("invalid SLO target: {0}")]
    InvalidTarget(String),

    // Deploy gate errors
    #[error("unknown decision: {0}")]
    UnknownDecision(String),

    #[error("decision is not blocked: {0}")]
    NotBlocked(String),

    #[error("role not authorized to override: {0}")]
    UnauthorizedRole(String),

    // Storage errors
    #[error("storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    SerializationError(String),

    // Generic errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
