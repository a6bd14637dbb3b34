//! Stream limits.

use sealpipe_proto::{FRAME_OVERHEAD, MAX_MESSAGE_SIZE};

use crate::error::ConfigError;

/// Default upper bound on a single message's plaintext (64 KiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Limits applied by [`crate::SecureReader`] and [`crate::SecureWriter`].
///
/// Both peers should agree on `max_message_size`; a reader rejects any frame
/// larger than its own limit before buffering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Largest plaintext carried by one frame
    pub max_message_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { max_message_size: DEFAULT_MAX_MESSAGE_SIZE }
    }
}

impl StreamConfig {
    /// Largest sealed frame (nonce, ciphertext and tag) this config accepts.
    pub fn max_frame_size(&self) -> usize {
        self.max_message_size.saturating_add(FRAME_OVERHEAD)
    }

    /// Check the limits against the wire format's ceiling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::MessageSizeTooLarge {
                size: self.max_message_size,
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(())
    }
}
