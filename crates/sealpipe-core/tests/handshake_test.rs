//! Handshake tests over in-memory duplex pipes.
//!
//! Each test drives real initiator/responder pairs (or one real side against
//! a hand-scripted peer) and checks the bytes exchanged, the resulting keys
//! and the failure modes when the peer misbehaves.

use sealpipe_core::{
    HandshakeError, HandshakeState, KeyPair, PublicKey, StreamConfig,
    handshake::{initiate, initiate_with_keypair, respond, respond_with_keypair},
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

#[tokio::test]
async fn both_sides_agree_on_keys() {
    let (a, b) = duplex(1024);
    let config = StreamConfig::default();

    let (initiator, responder) = tokio::join!(initiate(a, config), respond(b, config));
    let initiator = initiator.unwrap();
    let responder = responder.unwrap();

    assert_eq!(initiator.peer_public_key(), responder.local_public_key());
    assert_eq!(responder.peer_public_key(), initiator.local_public_key());

    let frame = initiator.session_key().seal(b"agreed").unwrap();
    assert_eq!(responder.session_key().open(&frame).unwrap(), b"agreed");
}

#[tokio::test]
async fn responder_writes_its_key_first() {
    let (mut raw, b) = duplex(1024);
    let keypair = KeyPair::from_secret_bytes([0x11; 32]);
    let expected = *keypair.public_key();

    let responder = tokio::spawn(async move {
        respond_with_keypair(b, keypair, StreamConfig::default()).await
    });

    // The responder must speak without waiting for us
    let mut received = [0u8; 32];
    raw.read_exact(&mut received).await.unwrap();
    assert_eq!(PublicKey::from(received), expected);

    let peer = KeyPair::from_secret_bytes([0x22; 32]);
    raw.write_all(peer.public_key().as_bytes()).await.unwrap();

    let stream = responder.await.unwrap().unwrap();
    assert_eq!(stream.peer_public_key(), peer.public_key());
}

#[tokio::test]
async fn initiator_reads_before_writing() {
    let (mut raw, a) = duplex(1024);
    let keypair = KeyPair::from_secret_bytes([0x33; 32]);
    let expected = *keypair.public_key();

    let initiator = tokio::spawn(async move {
        initiate_with_keypair(a, keypair, StreamConfig::default()).await
    });

    // Nothing arrives until the responder has sent its key
    let mut probe = [0u8; 1];
    let early =
        tokio::time::timeout(std::time::Duration::from_millis(50), raw.read(&mut probe)).await;
    assert!(early.is_err(), "initiator wrote before receiving");

    let peer = KeyPair::from_secret_bytes([0x44; 32]);
    raw.write_all(peer.public_key().as_bytes()).await.unwrap();

    let mut received = [0u8; 32];
    raw.read_exact(&mut received).await.unwrap();
    assert_eq!(PublicKey::from(received), expected);

    assert!(initiator.await.unwrap().is_ok());
}

#[tokio::test]
async fn key_split_across_writes_is_reassembled() {
    let (mut raw, a) = duplex(1024);
    let initiator = tokio::spawn(async move { initiate(a, StreamConfig::default()).await });

    let peer = KeyPair::from_secret_bytes([0x55; 32]);
    let bytes = peer.public_key().as_bytes();
    raw.write_all(&bytes[..7]).await.unwrap();
    tokio::task::yield_now().await;
    raw.write_all(&bytes[7..20]).await.unwrap();
    tokio::task::yield_now().await;
    raw.write_all(&bytes[20..]).await.unwrap();

    let mut own = [0u8; 32];
    raw.read_exact(&mut own).await.unwrap();

    let stream = initiator.await.unwrap().unwrap();
    assert_eq!(stream.peer_public_key(), peer.public_key());
    assert_eq!(stream.local_public_key().as_bytes(), &own);
}

#[tokio::test]
async fn peer_closing_mid_handshake_fails_initiator() {
    let (mut raw, a) = duplex(1024);
    let initiator = tokio::spawn(async move { initiate(a, StreamConfig::default()).await });

    raw.write_all(&[0xAB; 16]).await.unwrap();
    drop(raw);

    let err = initiator.await.unwrap().unwrap_err();
    assert!(matches!(err, HandshakeError::Io { state: HandshakeState::AwaitingKey, .. }));
}

#[tokio::test]
async fn peer_closing_before_reply_fails_responder() {
    let (mut raw, b) = duplex(1024);
    let responder = tokio::spawn(async move { respond(b, StreamConfig::default()).await });

    let mut key = [0u8; 32];
    raw.read_exact(&mut key).await.unwrap();
    drop(raw);

    let err = responder.await.unwrap().unwrap_err();
    assert!(matches!(err, HandshakeError::Io { state: HandshakeState::AwaitingKey, .. }));
}

#[tokio::test]
async fn all_zero_peer_key_is_rejected() {
    let (mut raw, b) = duplex(1024);
    let responder = tokio::spawn(async move { respond(b, StreamConfig::default()).await });

    let mut key = [0u8; 32];
    raw.read_exact(&mut key).await.unwrap();
    raw.write_all(&[0u8; 32]).await.unwrap();

    let err = responder.await.unwrap().unwrap_err();
    assert!(matches!(err, HandshakeError::InvalidPeerKey(_)));
}

#[tokio::test]
async fn every_connection_uses_fresh_keys() {
    let config = StreamConfig::default();

    let (a1, b1) = duplex(1024);
    let (first, _) = tokio::join!(initiate(a1, config), respond(b1, config));
    let (a2, b2) = duplex(1024);
    let (second, _) = tokio::join!(initiate(a2, config), respond(b2, config));

    let first = first.unwrap();
    let second = second.unwrap();
    assert_ne!(first.local_public_key(), second.local_public_key());

    let frame = first.session_key().seal(b"isolated").unwrap();
    assert!(second.session_key().open(&frame).is_err());
}
