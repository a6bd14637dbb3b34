//! Public key handshake.
//!
//! Each side sends its 32-byte X25519 public key exactly once, with no header
//! or version byte. The two roles use mirrored orders so a half-duplex
//! wrapper never sees both sides writing at once:
//!
//! ```text
//! Initiator                              Responder
//!    │                                      │
//!    │  ◀──────── responder public key ──── │  SendingKey
//!    │  AwaitingKey                         │
//!    │  ──── initiator public key ───────▶  │  AwaitingKey
//!    │  SendingKey                          │
//!    ▼                                      ▼
//! Established                          Established
//! ```
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start ┌────────────┐ key_sent / key_received ┌─────────────┐
//! │ Init │──────>│ SendingKey │<───────────────────────>│ AwaitingKey │
//! └──────┘       └────────────┘                         └─────────────┘
//!                      │                                      │
//!                      └────────────┬─────────────────────────┘
//!                                   │ second step done
//!                       ┌───────────┴───────────┐
//!                       ↓                       ↓ I/O failure
//!                ┌─────────────┐           ┌─────────┐
//!                │ Established │           │ Aborted │
//!                └─────────────┘           └─────────┘
//! ```
//!
//! [`Handshake`] is pure: it never touches a stream. [`drive`] executes its
//! actions, and [`initiate`] / [`respond`] wrap the result in a
//! [`SecureStream`].

use sealpipe_crypto::{KeyPair, PublicKey, SessionKey};
use sealpipe_proto::PUBLIC_KEY_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{SecureStream, StreamConfig, error::HandshakeError};

/// Which side of the connection this handshake runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dialed out; receives the peer's key first.
    Initiator,
    /// Accepted the connection; sends its key first.
    Responder,
}

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Key pair generated, nothing exchanged yet
    Init,
    /// Local public key must be written next
    SendingKey,
    /// Peer public key must be read next
    AwaitingKey,
    /// Both keys exchanged
    Established,
    /// A step failed; no key material is usable
    Aborted,
}

/// Actions returned by the handshake state machine.
///
/// The driver executes these against the raw stream:
/// - `SendKey`: write the 32 public key bytes
/// - `ReceiveKey`: read exactly 32 bytes and pass them to
///   [`Handshake::key_received`]
/// - `Complete`: call [`Handshake::finish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Write this public key to the peer
    SendKey(PublicKey),
    /// Read the peer's public key
    ReceiveKey,
    /// Both keys are exchanged
    Complete,
}

/// Keys negotiated by a completed handshake.
#[derive(Debug, Clone)]
pub struct Session {
    /// Our public key
    pub local_public: PublicKey,
    /// The peer's public key
    pub peer_public: PublicKey,
    /// Symmetric key for all frames in both directions
    pub key: SessionKey,
}

/// Handshake state machine for one connection side.
///
/// Owns the ephemeral key pair; the private key is dropped (and zeroized)
/// when [`Handshake::finish`] consumes the machine.
#[derive(Debug)]
pub struct Handshake {
    role: Role,
    state: HandshakeState,
    keypair: KeyPair,
    peer: Option<PublicKey>,
}

impl Handshake {
    /// Create a handshake in `Init` state.
    pub fn new(role: Role, keypair: KeyPair) -> Self {
        Self { role, state: HandshakeState::Init, keypair, peer: None }
    }

    /// Role of this side.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Our public key.
    pub fn local_public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// Peer public key, once received.
    pub fn peer_public_key(&self) -> Option<&PublicKey> {
        self.peer.as_ref()
    }

    /// Begin the exchange.
    ///
    /// Responders send first, initiators receive first.
    ///
    /// # Errors
    /// Returns `InvalidState` if not in `Init` state
    pub fn start(&mut self) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::Init, "start")?;

        Ok(match self.role {
            Role::Responder => {
                self.state = HandshakeState::SendingKey;
                HandshakeAction::SendKey(*self.keypair.public_key())
            },
            Role::Initiator => {
                self.state = HandshakeState::AwaitingKey;
                HandshakeAction::ReceiveKey
            },
        })
    }

    /// Record that our public key was fully written.
    ///
    /// # Errors
    /// Returns `InvalidState` if not in `SendingKey` state
    pub fn key_sent(&mut self) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::SendingKey, "key_sent")?;

        Ok(match self.role {
            Role::Responder => {
                self.state = HandshakeState::AwaitingKey;
                HandshakeAction::ReceiveKey
            },
            Role::Initiator => {
                self.state = HandshakeState::Established;
                HandshakeAction::Complete
            },
        })
    }

    /// Record the peer's public key.
    ///
    /// # Errors
    /// Returns `InvalidState` if not in `AwaitingKey` state
    pub fn key_received(&mut self, peer: PublicKey) -> Result<HandshakeAction, HandshakeError> {
        self.require(HandshakeState::AwaitingKey, "key_received")?;
        self.peer = Some(peer);

        Ok(match self.role {
            Role::Responder => {
                self.state = HandshakeState::Established;
                HandshakeAction::Complete
            },
            Role::Initiator => {
                self.state = HandshakeState::SendingKey;
                HandshakeAction::SendKey(*self.keypair.public_key())
            },
        })
    }

    /// Abandon the handshake. Any received peer key is discarded.
    pub fn abort(&mut self) {
        self.state = HandshakeState::Aborted;
        self.peer = None;
    }

    /// Derive the session key and consume the machine.
    ///
    /// # Errors
    /// - `InvalidState` if not `Established`
    /// - `InvalidPeerKey` if the peer key is unusable for key agreement
    pub fn finish(self) -> Result<Session, HandshakeError> {
        let Some(peer) = self.peer.filter(|_| self.state == HandshakeState::Established) else {
            return Err(HandshakeError::InvalidState { state: self.state, operation: "finish" });
        };

        let key = SessionKey::derive(&self.keypair, &peer).map_err(HandshakeError::InvalidPeerKey)?;

        Ok(Session { local_public: *self.keypair.public_key(), peer_public: peer, key })
    }

    fn require(
        &self,
        expected: HandshakeState,
        operation: &'static str,
    ) -> Result<(), HandshakeError> {
        if self.state != expected {
            return Err(HandshakeError::InvalidState { state: self.state, operation });
        }
        Ok(())
    }

    fn fail(&mut self, source: std::io::Error) -> HandshakeError {
        let state = self.state;
        self.abort();
        HandshakeError::Io { state, source }
    }
}

/// Run `handshake` to completion over `stream`.
///
/// Reads use a read-exactly loop, so a public key split across several
/// transport reads is reassembled. Any I/O failure aborts the handshake.
pub async fn drive<S>(stream: &mut S, mut handshake: Handshake) -> Result<Session, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let role = handshake.role();
    let mut action = handshake.start()?;

    loop {
        action = match action {
            HandshakeAction::SendKey(public) => {
                if let Err(err) = write_key(stream, &public).await {
                    return Err(handshake.fail(err));
                }
                trace!(?role, "public key sent");
                handshake.key_sent()?
            },
            HandshakeAction::ReceiveKey => {
                let mut peer = [0u8; PUBLIC_KEY_SIZE];
                if let Err(err) = stream.read_exact(&mut peer).await {
                    return Err(handshake.fail(err));
                }
                trace!(?role, "peer public key received");
                handshake.key_received(PublicKey::from(peer))?
            },
            HandshakeAction::Complete => break,
        };
    }

    let session = handshake.finish()?;
    debug!(?role, "handshake established");
    Ok(session)
}

async fn write_key<S>(stream: &mut S, public: &PublicKey) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(public.as_bytes()).await?;
    stream.flush().await
}

/// Run the initiator handshake with a freshly generated key pair.
pub async fn initiate<S>(stream: S, config: StreamConfig) -> Result<SecureStream<S>, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let keypair = KeyPair::generate().map_err(HandshakeError::KeyGeneration)?;
    initiate_with_keypair(stream, keypair, config).await
}

/// Run the initiator handshake with a caller-supplied key pair.
pub async fn initiate_with_keypair<S>(
    mut stream: S,
    keypair: KeyPair,
    config: StreamConfig,
) -> Result<SecureStream<S>, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session = drive(&mut stream, Handshake::new(Role::Initiator, keypair)).await?;
    Ok(SecureStream::new(stream, session, config))
}

/// Run the responder handshake with a freshly generated key pair.
pub async fn respond<S>(stream: S, config: StreamConfig) -> Result<SecureStream<S>, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let keypair = KeyPair::generate().map_err(HandshakeError::KeyGeneration)?;
    respond_with_keypair(stream, keypair, config).await
}

/// Run the responder handshake with a caller-supplied key pair.
pub async fn respond_with_keypair<S>(
    mut stream: S,
    keypair: KeyPair,
    config: StreamConfig,
) -> Result<SecureStream<S>, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session = drive(&mut stream, Handshake::new(Role::Responder, keypair)).await?;
    Ok(SecureStream::new(stream, session, config))
}
