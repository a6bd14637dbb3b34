//! Wire format for the sealpipe encrypted stream transport.
//!
//! A connection carries two kinds of bytes. The handshake is exactly
//! [`PUBLIC_KEY_SIZE`] raw bytes per side with no header. After the
//! handshake, every application message travels as one sealed frame behind a
//! 4-byte big-endian length header:
//!
//! ```text
//! ┌──────────────┬────────────────┬──────────────────────────────────┐
//! │ len (u32 BE) │ nonce (24)     │ ciphertext (plaintext_len + 16)  │
//! └──────────────┴────────────────┴──────────────────────────────────┘
//!                 └──────────────── len bytes ───────────────────────┘
//! ```
//!
//! The length header decouples logical frames from transport I/O
//! granularity, so a frame split across several TCP segments (or several
//! frames merged into one) still decodes correctly.
//!
//! # Security
//!
//! Headers are parsed through compile-time verified layouts via `zerocopy`.
//! Declared lengths are checked against the receiver's limit before a single
//! body byte is buffered, with an absolute ceiling of [`MAX_FRAME_SIZE`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod header;

pub use errors::{ProtocolError, Result};
pub use frame::{SealedFrame, encode_frame};
pub use header::FrameHeader;

/// Size of an X25519 public key, and of each side's handshake message.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of the random XChaCha20-Poly1305 nonce prefixed to every frame.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_SIZE: usize = 16;

/// Bytes a sealed frame adds on top of its plaintext.
pub const FRAME_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Smallest valid sealed frame: nonce and tag around an empty plaintext.
pub const MIN_FRAME_SIZE: usize = FRAME_OVERHEAD;

/// Absolute ceiling on a sealed frame's length (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Largest plaintext that fits in a frame of [`MAX_FRAME_SIZE`].
pub const MAX_MESSAGE_SIZE: usize = MAX_FRAME_SIZE - FRAME_OVERHEAD;

/// Length of the sealed frame produced for a plaintext of `plaintext_len`.
pub const fn sealed_len(plaintext_len: usize) -> usize {
    plaintext_len + FRAME_OVERHEAD
}
