//! Initiator-side dialing.

use sealpipe_crypto::KeyPair;
use tracing::debug;

use crate::{
    SecureStream, StreamConfig, error::{DialError, HandshakeError}, handshake,
    transport::Connector,
};

/// Connect to `remote` and run the initiator handshake.
///
/// The key pair is generated before any connection is opened, so an entropy
/// failure never leaves a half-open socket behind.
///
/// # Errors
///
/// - [`DialError::Handshake`] wrapping [`HandshakeError::KeyGeneration`] if
///   no key pair could be generated
/// - [`DialError::Connect`] if the raw connection could not be opened
/// - [`DialError::Handshake`] if the key exchange failed
pub async fn dial<C>(
    connector: &C,
    remote: &str,
    config: StreamConfig,
) -> Result<SecureStream<C::Stream>, DialError>
where
    C: Connector,
{
    let keypair = KeyPair::generate().map_err(HandshakeError::KeyGeneration)?;

    let stream = connector
        .connect(remote)
        .await
        .map_err(|source| DialError::Connect { remote: remote.to_owned(), source })?;
    debug!(remote, "connected, starting handshake");

    Ok(handshake::initiate_with_keypair(stream, keypair, config).await?)
}
