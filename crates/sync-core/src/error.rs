//! Error types shared by the grist-sync library crates.

use thiserror::Error;

/// Marker the document service puts in error messages for a transient
/// database lock. Requests failing with it are safe to retry unchanged.
pub const TRANSIENT_LOCK_MARKER: &str = "SQLITE_BUSY";

/// Errors returned by value conversion, planning, synchronization and the
/// remote store implementations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required credential or setting is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input rejected before anything was sent for the offending batch.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote store answered with a non-success status.
    #[error("Remote request failed with status {status}: {message}")]
    RemoteRequest { status: u16, message: String },

    /// The request never produced a usable response.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote store answered successfully but with a body of the wrong shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error from anything displayable.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true for the lock-contention failure that may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RemoteRequest { message, .. } => message.contains(TRANSIENT_LOCK_MARKER),
            _ => false,
        }
    }
}

/// Result type for grist-sync library operations.
pub type Result<T> = std::result::Result<T, Error>;
