//! sealpipe protocol core.
//!
//! Establishes an encrypted point-to-point channel over any reliable, ordered
//! byte stream and carries authenticated-encrypted messages over it.
//!
//! # Architecture
//!
//! The handshake is a deterministic state machine ([`handshake::Handshake`])
//! that is isolated from I/O. Transitions return declarative
//! [`handshake::HandshakeAction`]s; the async drivers in [`handshake`]
//! execute them against a stream. This keeps the role-specific message order
//! testable without a socket.
//!
//! Once established, a connection is a [`SecureStream`]: one
//! [`SecureReader`] and one [`SecureWriter`] over the two halves of the raw
//! stream, sharing the session key. Every logical write produces exactly one
//! sealed frame and every logical read consumes exactly one.
//!
//! ```text
//! KeyPair ──▶ Handshake (32-byte public keys) ──▶ SessionKey
//!                                                   │
//!   app bytes ──▶ SecureWriter ──▶ len || nonce || ciphertext ──▶ raw stream
//!   app bytes ◀── SecureReader ◀── len || nonce || ciphertext ◀── raw stream
//! ```
//!
//! # Concurrency
//!
//! Every connection exclusively owns its key pair, peer key and session key.
//! Nothing is shared between connections, so no locking is involved. Reads
//! and writes block only on the underlying stream; timeouts belong to the
//! stream's configuration.
//!
//! # Components
//!
//! - [`handshake`]: Handshake state machine and async drivers
//! - [`stream`]: Secure reader, writer and connection object
//! - [`transport`]: Raw stream capabilities (TCP in production, simulated or
//!   in-memory in tests)
//! - [`client`]: Dial helper for the initiator side
//! - [`config`]: Stream limits
//! - [`error`]: Error kinds

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod handshake;
pub mod stream;
pub mod transport;

pub use client::dial;
pub use config::StreamConfig;
pub use error::{ConfigError, DialError, HandshakeError, StreamError};
pub use handshake::{Handshake, HandshakeAction, HandshakeState, Role, Session};
pub use sealpipe_crypto::{CryptoError, KeyPair, PublicKey, SessionKey};
pub use stream::{SecureReader, SecureStream, SecureWriter};
pub use transport::{Acceptor, Connector, TcpAcceptor, TcpConnector};
