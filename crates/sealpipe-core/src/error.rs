//! Error kinds surfaced by the core.
//!
//! The four failure classes of the protocol map to:
//!
//! - key generation: [`HandshakeError::KeyGeneration`] (wrapping
//!   [`CryptoError::KeyGeneration`])
//! - handshake: [`HandshakeError`]
//! - stream I/O, including end of stream: [`StreamError::Io`]
//! - authentication failure: [`StreamError::Decryption`]
//!
//! Nothing in the core retries; every error reaches the immediate caller.

use std::io;

use sealpipe_crypto::CryptoError;
use sealpipe_proto::ProtocolError;
use thiserror::Error;

use crate::handshake::HandshakeState;

/// Handshake failures. The connection never reaches the established state.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The local key pair could not be generated.
    #[error("key generation failed: {0}")]
    KeyGeneration(#[source] CryptoError),

    /// Reading or writing a public key failed.
    #[error("handshake I/O failed in state {state:?}: {source}")]
    Io {
        /// State the handshake was in when the I/O failed
        state: HandshakeState,
        /// Underlying stream error
        #[source]
        source: io::Error,
    },

    /// The peer's public key cannot be used for key agreement.
    #[error("peer public key rejected: {0}")]
    InvalidPeerKey(#[source] CryptoError),

    /// A state machine method was called out of order.
    #[error("cannot {operation} in handshake state {state:?}")]
    InvalidState {
        /// Current state
        state: HandshakeState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

/// Failures of an established secure stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying stream failed or reached end of stream.
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The frame failed authentication: wrong key, corruption or tampering.
    #[error("frame failed authentication")]
    Decryption,

    /// A frame or message violated the wire format's size limits.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The decrypted message does not fit in the caller's buffer.
    #[error("message of {needed} bytes does not fit in {capacity} byte buffer")]
    BufferTooSmall {
        /// Plaintext length of the received message
        needed: usize,
        /// Length of the caller's buffer
        capacity: usize,
    },

    /// Sealing failed (entropy source failure).
    #[error(transparent)]
    Crypto(CryptoError),
}

impl StreamError {
    /// True if the peer closed the stream.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }

    /// True if a frame was rejected by authenticated decryption.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Decryption)
    }
}

impl From<CryptoError> for StreamError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption => Self::Decryption,
            other => Self::Crypto(other),
        }
    }
}

/// Failures while dialing a responder.
#[derive(Debug, Error)]
pub enum DialError {
    /// The raw connection could not be opened.
    #[error("failed to connect to {remote}: {source}")]
    Connect {
        /// Address that was dialed
        remote: String,
        /// Underlying transport error
        #[source]
        source: io::Error,
    },

    /// The connection opened but the handshake failed.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
}

/// Invalid configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Message limit exceeds what a frame can carry.
    #[error("max message size {size} exceeds protocol limit {max}")]
    MessageSizeTooLarge {
        /// Configured limit
        size: usize,
        /// Protocol ceiling
        max: usize,
    },

    /// A buffer size is zero.
    #[error("{name} must be greater than zero")]
    ZeroSize {
        /// Name of the offending setting
        name: &'static str,
    },
}
