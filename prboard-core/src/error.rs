//! Error types for prboard

use thiserror::Error;

/// Result type alias for prboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for prboard operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Repository reference not of the form `owner/name`
    #[error("Invalid repository '{0}'. Expected owner/name")]
    InvalidRepository(String),

    /// The upstream search API failed
    #[error("Upstream search failed: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an upstream client error
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Upstream(Box::new(err))
    }

    /// Whether this error came from the upstream search API
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream(_))
    }
}
