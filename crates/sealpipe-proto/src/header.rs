//! Length header preceding every sealed frame.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::big_endian::U32};

use crate::{MAX_FRAME_SIZE, ProtocolError, Result};

/// Fixed 4-byte header carrying the length of the sealed frame that follows.
///
/// The length counts nonce and ciphertext (tag included) but not the header
/// itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct FrameHeader {
    body_len: U32,
}

impl FrameHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 4;

    /// Build a header for a sealed frame of `body_len` bytes.
    ///
    /// Fails with [`ProtocolError::FrameTooLarge`] if `body_len` exceeds
    /// `max` or [`MAX_FRAME_SIZE`], whichever is smaller.
    pub fn new(body_len: usize, max: usize) -> Result<Self> {
        let limit = max.min(MAX_FRAME_SIZE);
        if body_len > limit {
            return Err(ProtocolError::FrameTooLarge { size: body_len, max: limit });
        }

        Ok(Self { body_len: U32::new(body_len as u32) })
    }

    /// Parse a header from exactly [`Self::SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_bytes(bytes)
            .map_err(|_| ProtocolError::HeaderLength { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Declared length of the sealed frame.
    pub fn body_len(&self) -> usize {
        self.body_len.get() as usize
    }

    /// Reject headers whose declared length exceeds `max` (capped at
    /// [`MAX_FRAME_SIZE`]).
    ///
    /// Receivers call this before allocating space for the body.
    pub fn validate(&self, max: usize) -> Result<()> {
        let limit = max.min(MAX_FRAME_SIZE);
        let size = self.body_len();
        if size > limit {
            return Err(ProtocolError::FrameTooLarge { size, max: limit });
        }
        Ok(())
    }

    /// Header as wire bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        self.body_len.get().to_be_bytes()
    }
}
