//! Ephemeral X25519 key pairs.

use std::fmt;

use x25519_dalek::{SharedSecret, StaticSecret};
pub use x25519_dalek::PublicKey;
use zeroize::Zeroizing;

use crate::CryptoError;

/// Ephemeral X25519 key pair owned by one side of one connection.
///
/// The private half is zeroized on drop. Key pairs are never persisted or
/// reused across connections.
pub struct KeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS entropy source.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyGeneration`] if the entropy source fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        getrandom::fill(bytes.as_mut_slice()).map_err(CryptoError::KeyGeneration)?;
        Ok(Self::from_secret_bytes(*bytes))
    }

    /// Build a key pair from caller-provided private key bytes.
    ///
    /// Deterministic; intended for tests and fixtures. The bytes must come
    /// from a cryptographically secure source in any other setting.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public half, sent to the peer during the handshake.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn diffie_hellman(&self, peer: &PublicKey) -> SharedSecret {
        self.secret.diffie_hellman(peer)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public).finish_non_exhaustive()
    }
}
