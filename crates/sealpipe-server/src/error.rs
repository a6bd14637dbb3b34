//! Server error types.

use std::{io, net::SocketAddr};

use sealpipe_core::{ConfigError, HandshakeError, StreamError};
use thiserror::Error;

/// Failures that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Accepting a connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
}

/// Failures that close one connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The responder handshake failed.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Reading or writing the secure stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),
}
