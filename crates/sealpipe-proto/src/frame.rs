//! Sealed frame layout.
//!
//! A sealed frame is `nonce || ciphertext`. This module only splits and
//! assembles bytes; authentication happens in `sealpipe-crypto`.

use bytes::{BufMut, BytesMut};

use crate::{FrameHeader, MIN_FRAME_SIZE, NONCE_SIZE, ProtocolError, Result, TAG_SIZE};

/// Borrowed view of a sealed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedFrame<'a> {
    nonce: &'a [u8; NONCE_SIZE],
    ciphertext: &'a [u8],
}

impl<'a> SealedFrame<'a> {
    /// Split `bytes` into nonce and ciphertext.
    ///
    /// Frames shorter than [`MIN_FRAME_SIZE`] cannot contain a nonce and a
    /// tag and are rejected without further inspection.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort { len: bytes.len(), min: MIN_FRAME_SIZE });
        }

        let (nonce, ciphertext) = bytes
            .split_first_chunk::<NONCE_SIZE>()
            .ok_or(ProtocolError::FrameTooShort { len: bytes.len(), min: MIN_FRAME_SIZE })?;

        Ok(Self { nonce, ciphertext })
    }

    /// Random nonce the frame was sealed under.
    pub fn nonce(&self) -> &'a [u8; NONCE_SIZE] {
        self.nonce
    }

    /// Ciphertext including the trailing authentication tag.
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    /// Length of the plaintext this frame decrypts to.
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len() - TAG_SIZE
    }
}

/// Append `header || frame` to `dst`.
///
/// `max` is the largest sealed frame the peer accepts.
pub fn encode_frame(frame: &[u8], max: usize, dst: &mut BytesMut) -> Result<()> {
    let header = FrameHeader::new(frame.len(), max)?;
    dst.reserve(FrameHeader::SIZE + frame.len());
    dst.put_slice(&header.to_bytes());
    dst.put_slice(frame);
    Ok(())
}
