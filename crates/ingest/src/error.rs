//! HTTP server error types

/// HTTP server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        /// The address that could not be bound
        address: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server runtime error
    #[error("HTTP error: {0}")]
    Http(String),
}
