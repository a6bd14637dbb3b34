//! Session key derivation and frame sealing.

use std::fmt;

use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use sealpipe_proto::{NONCE_SIZE, SealedFrame, sealed_len};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, KeyPair, PublicKey};

/// HKDF info label; versioned so a future derivation can never collide.
const SESSION_KEY_INFO: &[u8] = b"sealpipe/v1 session key";

/// Symmetric key shared by both sides of one connection.
///
/// Derived once after the handshake and used for every frame in both
/// directions. Both peers arrive at the same value from their own
/// `(private key, peer public key)` pair.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: [u8; 32],
}

impl SessionKey {
    /// Derive the session key from the local key pair and the peer's public
    /// key.
    ///
    /// The HKDF info binds both public keys in sorted order, which keeps the
    /// derivation symmetric between initiator and responder.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::NonContributory`] if the peer key is a low-order point
    /// - [`CryptoError::KeyDerivation`] if HKDF expansion fails
    pub fn derive(local: &KeyPair, peer: &PublicKey) -> Result<Self, CryptoError> {
        let shared = local.diffie_hellman(peer);
        if !shared.was_contributory() {
            return Err(CryptoError::NonContributory);
        }

        let ours = local.public_key().as_bytes();
        let theirs = peer.as_bytes();
        let (first, second) = if ours <= theirs { (ours, theirs) } else { (theirs, ours) };

        let mut info = Vec::with_capacity(SESSION_KEY_INFO.len() + 64);
        info.extend_from_slice(SESSION_KEY_INFO);
        info.extend_from_slice(first);
        info.extend_from_slice(second);

        let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
        let mut key = [0u8; 32];
        hkdf.expand(&info, &mut key).map_err(|_| CryptoError::KeyDerivation)?;

        Ok(Self { key })
    }

    /// Wrap raw key bytes. For tests and fuzzing.
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Seal `plaintext` under a fresh random nonce.
    ///
    /// Returns `nonce || ciphertext`, which is always
    /// `plaintext.len() + 40` bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NonceGeneration`] if the entropy source fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce).map_err(CryptoError::NonceGeneration)?;
        self.seal_with_nonce(plaintext, &nonce)
    }

    /// Seal `plaintext` under a caller-chosen nonce.
    ///
    /// The caller must never repeat a nonce under the same key. Production
    /// code goes through [`Self::seal`].
    pub fn seal_with_nonce(
        &self,
        plaintext: &[u8],
        nonce: &[u8; NONCE_SIZE],
    ) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = self
            .cipher()
            .encrypt(XNonce::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::Encryption)?;

        let mut frame = Vec::with_capacity(sealed_len(plaintext.len()));
        frame.extend_from_slice(nonce);
        frame.extend_from_slice(&ciphertext);
        Ok(frame)
    }

    /// Authenticate and decrypt a sealed frame.
    ///
    /// Frames shorter than nonce plus tag are rejected without attempting
    /// decryption. No partial plaintext is ever returned.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decryption`] for truncated, corrupted or
    /// tampered frames and for frames sealed under another key.
    pub fn open(&self, frame: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let frame = SealedFrame::parse(frame).map_err(|_| CryptoError::Decryption)?;

        self.cipher()
            .decrypt(XNonce::from_slice(frame.nonce()), frame.ciphertext())
            .map_err(|_| CryptoError::Decryption)
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.key))
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}
