//! Cryptographic errors.

use thiserror::Error;

/// Errors from key generation, key agreement, sealing and opening.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The OS entropy source failed while generating a private key.
    #[error("entropy source failed while generating key pair: {0}")]
    KeyGeneration(getrandom::Error),

    /// The OS entropy source failed while generating a frame nonce.
    #[error("entropy source failed while generating nonce: {0}")]
    NonceGeneration(getrandom::Error),

    /// The peer's public key produced an all-zero shared secret.
    #[error("peer public key produced a non-contributory shared secret")]
    NonContributory,

    /// HKDF refused the requested output length.
    #[error("session key derivation failed")]
    KeyDerivation,

    /// The AEAD rejected the plaintext.
    #[error("frame encryption failed")]
    Encryption,

    /// The frame is truncated, corrupted, tampered with, or sealed under a
    /// different key.
    #[error("frame failed authentication")]
    Decryption,
}
