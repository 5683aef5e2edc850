//! Error types for the gateway server.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for gateway server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while starting or running the gateway.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// A configuration file could not be loaded.
    #[error("failed to load {}: {reason}", path.display())]
    Config {
        /// The offending file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Creates a [`ServerError::Config`] for `path`.
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
