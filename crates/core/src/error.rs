//! Error types for bcp-core
//!
//! Errors fall into three groups: configuration errors and listing failures
//! abort a run, everything else is scoped to a single copy.

use thiserror::Error;

/// Result type alias for bcp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bcp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Backend asked us to slow down
    #[error("Throttled: {0}")]
    Throttled(String),

    /// Credentials missing, expired or rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source bucket could not be enumerated
    #[error("Failed to list bucket '{bucket}': {source}")]
    Listing {
        bucket: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    General(String),
}

impl Error {
    /// Wrap a backend error as a listing failure for `bucket`
    pub fn listing(bucket: impl Into<String>, source: Error) -> Self {
        match source {
            Error::Listing { .. } => source,
            other => Error::Listing {
                bucket: bucket.into(),
                source: Box::new(other),
            },
        }
    }

    /// Whether this error aborts the whole run rather than a single copy
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Listing { .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
