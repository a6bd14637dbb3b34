//! Wire format errors.

use thiserror::Error;

/// Result alias for wire format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Header buffer has the wrong length.
    #[error("frame header must be {expected} bytes, got {actual}")]
    HeaderLength {
        /// Required header size
        expected: usize,
        /// Size of the supplied buffer
        actual: usize,
    },

    /// Declared or actual frame length exceeds the receiver's limit.
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Frame length in bytes
        size: usize,
        /// Maximum accepted frame length
        max: usize,
    },

    /// Plaintext is longer than a single frame may carry.
    #[error("message of {size} bytes exceeds limit of {max} bytes")]
    MessageTooLarge {
        /// Plaintext length in bytes
        size: usize,
        /// Maximum accepted plaintext length
        max: usize,
    },

    /// Frame cannot hold a nonce and an authentication tag.
    #[error("frame of {len} bytes is shorter than the {min} byte minimum")]
    FrameTooShort {
        /// Frame length in bytes
        len: usize,
        /// Minimum valid frame length
        min: usize,
    },
}
