//! Error types for the nodedns system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for nodedns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the nodedns system
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input (bad node id, malformed domain name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Node index outside the node collection
    #[error("Node index out of range: {index} (nodes: {len})")]
    OutOfRange {
        /// Requested index
        index: i64,
        /// Length of the node collection at lookup time
        len: usize,
    },

    /// Provider configuration absent or incomplete
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// No factory registered for the provider type
    #[error("Unsupported DNS provider type: {0}")]
    UnsupportedProvider(String),

    /// Transport failure or non-success status from a provider API
    #[error("Provider error ({provider}): {message}")]
    Remote {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// No matching DNS record
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Store persistence errors
    #[error("Store error: {0}")]
    StateStore(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a missing configuration error
    pub fn missing_config(msg: impl Into<String>) -> Self {
        Self::MissingConfig(msg.into())
    }

    /// Create an unsupported provider error
    pub fn unsupported_provider(provider_type: impl Into<String>) -> Self {
        Self::UnsupportedProvider(provider_type.into())
    }

    /// Create a provider (remote API) error
    pub fn remote(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether the caller is at fault
    ///
    /// The HTTP surface maps these to `400`; everything else is a `500`.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
