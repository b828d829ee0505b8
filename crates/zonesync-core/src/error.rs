//! Error types for zonesync
//!
//! Every failure a reconciliation cycle can hit maps onto one of the
//! variants below. Only [`Error::Config`] is fatal, and only at startup.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP lookup failed (transport, status, unparsable body, deadline)
    #[error("IP resolution error: {0}")]
    Resolution(String),

    /// DNS provider call failed (transport, auth, status, deadline)
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A fetched record whose content is not an IP address
    #[error("Record {record_id} has invalid content: {content:?}")]
    InvalidRemoteRecord {
        /// Provider record identifier
        record_id: String,
        /// The offending content
        content: String,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a provider error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid remote record error
    pub fn invalid_remote_record(record_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::InvalidRemoteRecord {
            record_id: record_id.into(),
            content: content.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error should stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
