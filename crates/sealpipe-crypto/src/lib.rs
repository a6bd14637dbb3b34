//! Cryptographic primitives for sealpipe.
//!
//! Each connection side generates an ephemeral X25519 [`KeyPair`], learns the
//! peer's [`PublicKey`] during the handshake, and derives one [`SessionKey`]
//! that seals and opens every frame for the rest of the connection.
//!
//! # Key Lifecycle
//!
//! ```text
//! getrandom ──▶ KeyPair (ephemeral, one per connection side)
//!                  │
//!                  ▼ X25519(private, peer public)
//!              shared secret
//!                  │
//!                  ▼ HKDF-SHA256(info = label || sorted public keys)
//!              SessionKey (32 bytes)
//!                  │
//!                  ▼ XChaCha20-Poly1305, fresh random 24-byte nonce per frame
//!              nonce || ciphertext
//! ```
//!
//! # Security
//!
//! Nonce uniqueness:
//! - Every call to [`SessionKey::seal`] draws a new 24-byte nonce from the OS
//!   entropy source. At 192 bits, random collisions are negligible for any
//!   realistic number of frames under one key.
//! - Entropy failures are returned as errors; there is no fallback source.
//!
//! Key validity:
//! - Peer keys that yield a non-contributory shared secret (low-order points,
//!   including the all-zero key) are rejected before derivation.
//!
//! Secret hygiene:
//! - Private keys and session keys are zeroized on drop and never appear in
//!   `Debug` output.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod keys;
pub mod session;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey};
pub use session::SessionKey;
