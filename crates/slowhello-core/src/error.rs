//! Error types for slowhello-core

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for slowhello operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the slowhello HTTP server
#[derive(Debug, Error)]
pub enum Error {
    /// Route pattern does not start with `/`
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Listen address could not be parsed
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    /// Listener could not be set up
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
