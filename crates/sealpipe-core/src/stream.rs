//! Secure stream adapters.
//!
//! [`SecureWriter`] turns each logical write into exactly one sealed frame
//! and one `write_all` on the raw stream. [`SecureReader`] turns each logical
//! read into exactly one frame read (header, then body) and one open. The
//! length header makes this independent of how the transport segments bytes.
//!
//! [`SecureStream`] bundles both adapters over the halves of one raw stream
//! and is the connection object handed to applications after the handshake.

use bytes::BytesMut;
use sealpipe_crypto::{CryptoError, KeyPair, PublicKey, SessionKey};
use sealpipe_proto::{FrameHeader, ProtocolError, encode_frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tracing::trace;

use crate::{StreamConfig, error::StreamError, handshake::Session};

/// Decrypting reader over a raw byte stream.
#[derive(Debug)]
pub struct SecureReader<R> {
    inner: R,
    key: SessionKey,
    config: StreamConfig,
    frame: Vec<u8>,
}

impl<R> SecureReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Wrap `inner`, opening frames with a precomputed session key.
    pub fn new(inner: R, key: SessionKey, config: StreamConfig) -> Self {
        Self { inner, key, config, frame: Vec::new() }
    }

    /// Wrap `inner`, deriving the session key from our key pair and the peer's
    /// public key.
    pub fn from_keys(
        inner: R,
        local: &KeyPair,
        peer: &PublicKey,
        config: StreamConfig,
    ) -> Result<Self, CryptoError> {
        Ok(Self::new(inner, SessionKey::derive(local, peer)?, config))
    }

    /// Read one message into `buf` and return its length.
    ///
    /// On any error nothing is written to `buf`. A message longer than `buf`
    /// fails with [`StreamError::BufferTooSmall`] and is discarded.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Io`] if the raw stream fails or ends (checked first)
    /// - [`StreamError::Protocol`] if the declared frame length exceeds the
    ///   configured limit
    /// - [`StreamError::Decryption`] if the frame fails authentication
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let plaintext = self.read_message().await?;
        if plaintext.len() > buf.len() {
            return Err(StreamError::BufferTooSmall {
                needed: plaintext.len(),
                capacity: buf.len(),
            });
        }

        buf[..plaintext.len()].copy_from_slice(&plaintext);
        Ok(plaintext.len())
    }

    /// Read one message and return its plaintext.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, StreamError> {
        self.read_frame().await?;
        let plaintext = self.key.open(&self.frame)?;
        trace!(len = plaintext.len(), "frame opened");
        Ok(plaintext)
    }

    async fn read_frame(&mut self) -> Result<(), StreamError> {
        let mut header = [0u8; FrameHeader::SIZE];
        self.inner.read_exact(&mut header).await?;

        let header = FrameHeader::from_bytes(&header)?;
        header.validate(self.config.max_frame_size())?;

        self.frame.clear();
        self.frame.resize(header.body_len(), 0);
        self.inner.read_exact(&mut self.frame).await?;
        Ok(())
    }

    /// Session key used to open frames.
    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Encrypting writer over a raw byte stream.
#[derive(Debug)]
pub struct SecureWriter<W> {
    inner: W,
    key: SessionKey,
    config: StreamConfig,
    buf: BytesMut,
}

impl<W> SecureWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap `inner`, sealing frames with a precomputed session key.
    pub fn new(inner: W, key: SessionKey, config: StreamConfig) -> Self {
        Self { inner, key, config, buf: BytesMut::new() }
    }

    /// Wrap `inner`, deriving the session key from our key pair and the peer's
    /// public key.
    pub fn from_keys(
        inner: W,
        local: &KeyPair,
        peer: &PublicKey,
        config: StreamConfig,
    ) -> Result<Self, CryptoError> {
        Ok(Self::new(inner, SessionKey::derive(local, peer)?, config))
    }

    /// Seal `plaintext` into one frame and write it.
    ///
    /// Returns the number of plaintext bytes written, never the frame's
    /// length on the wire.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Protocol`] if `plaintext` exceeds the message limit;
    ///   nothing is written
    /// - [`StreamError::Crypto`] if no nonce could be generated
    /// - [`StreamError::Io`] if the raw stream does not accept the frame
    pub async fn write(&mut self, plaintext: &[u8]) -> Result<usize, StreamError> {
        let max = self.config.max_message_size;
        if plaintext.len() > max {
            return Err(ProtocolError::MessageTooLarge { size: plaintext.len(), max }.into());
        }

        let frame = self.key.seal(plaintext)?;
        self.buf.clear();
        encode_frame(&frame, self.config.max_frame_size(), &mut self.buf)?;

        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await?;
        trace!(len = plaintext.len(), "frame sealed");
        Ok(plaintext.len())
    }

    /// Shut down the write direction of the underlying stream.
    pub async fn shutdown(mut self) -> Result<(), StreamError> {
        self.inner.shutdown().await?;
        Ok(())
    }

    /// Session key used to seal frames.
    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    /// Underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Established encrypted connection.
///
/// Exclusively owns the raw stream. [`SecureStream::shutdown`] consumes the
/// connection, so the stream is released exactly once.
#[derive(Debug)]
pub struct SecureStream<S> {
    reader: SecureReader<ReadHalf<S>>,
    writer: SecureWriter<WriteHalf<S>>,
    local_public: PublicKey,
    peer_public: PublicKey,
}

impl<S> SecureStream<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap a raw stream whose handshake produced `session`.
    pub fn new(stream: S, session: Session, config: StreamConfig) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let Session { local_public, peer_public, key } = session;

        Self {
            reader: SecureReader::new(read_half, key.clone(), config),
            writer: SecureWriter::new(write_half, key, config),
            local_public,
            peer_public,
        }
    }

    /// Read one message into `buf`. See [`SecureReader::read`].
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.reader.read(buf).await
    }

    /// Read one message. See [`SecureReader::read_message`].
    pub async fn read_message(&mut self) -> Result<Vec<u8>, StreamError> {
        self.reader.read_message().await
    }

    /// Write one message. See [`SecureWriter::write`].
    pub async fn write(&mut self, plaintext: &[u8]) -> Result<usize, StreamError> {
        self.writer.write(plaintext).await
    }

    /// Our public key for this connection.
    pub fn local_public_key(&self) -> &PublicKey {
        &self.local_public
    }

    /// The peer's public key learned during the handshake.
    pub fn peer_public_key(&self) -> &PublicKey {
        &self.peer_public
    }

    /// Session key shared by both directions.
    pub fn session_key(&self) -> &SessionKey {
        self.reader.session_key()
    }

    /// Split into independently usable reader and writer.
    pub fn into_split(self) -> (SecureReader<ReadHalf<S>>, SecureWriter<WriteHalf<S>>) {
        (self.reader, self.writer)
    }

    /// Close the write direction and release the connection.
    pub async fn shutdown(self) -> Result<(), StreamError> {
        self.writer.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use proptest::prelude::*;

    use super::*;

    fn key() -> SessionKey {
        SessionKey::from_bytes([3u8; 32])
    }

    async fn sealed(messages: &[&[u8]]) -> Vec<u8> {
        let mut writer = SecureWriter::new(Vec::new(), key(), StreamConfig::default());
        for message in messages {
            writer.write(message).await.unwrap();
        }
        writer.into_inner()
    }

    #[tokio::test]
    async fn write_reports_plaintext_length() {
        let mut writer = SecureWriter::new(Vec::new(), key(), StreamConfig::default());
        assert_eq!(writer.write(b"hello").await.unwrap(), 5);

        let wire = writer.into_inner();
        assert_eq!(wire.len(), FrameHeader::SIZE + 5 + 40);
        assert_eq!(&wire[..4], &45u32.to_be_bytes());
    }

    #[tokio::test]
    async fn read_back_consecutive_messages() {
        let wire = sealed(&[b"one".as_slice(), b"", b"three"]).await;
        let mut reader = SecureReader::new(wire.as_slice(), key(), StreamConfig::default());

        assert_eq!(reader.read_message().await.unwrap(), b"one");
        assert!(reader.read_message().await.unwrap().is_empty());
        assert_eq!(reader.read_message().await.unwrap(), b"three");
        assert!(reader.read_message().await.unwrap_err().is_closed());
    }

    #[tokio::test]
    async fn oversized_message_is_not_written() {
        let config = StreamConfig { max_message_size: 8 };
        let mut writer = SecureWriter::new(Vec::new(), key(), config);

        let err = writer.write(&[0u8; 9]).await.unwrap_err();
        assert!(matches!(
            err,
            StreamError::Protocol(ProtocolError::MessageTooLarge { size: 9, max: 8 })
        ));
        assert!(writer.get_ref().is_empty());
    }

    #[tokio::test]
    async fn oversized_declaration_is_rejected_before_buffering() {
        let wire = [0xFFu8, 0xFF, 0xFF, 0xFF];
        let mut reader = SecureReader::new(&wire[..], key(), StreamConfig::default());

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(err, StreamError::Protocol(ProtocolError::FrameTooLarge { .. })));
        assert!(reader.frame.is_empty());
    }

    #[tokio::test]
    async fn short_frame_is_decryption_failure() {
        let mut wire = 10u32.to_be_bytes().to_vec();
        wire.extend_from_slice(&[0u8; 10]);
        let mut reader = SecureReader::new(wire.as_slice(), key(), StreamConfig::default());

        assert!(reader.read_message().await.unwrap_err().is_decryption_failure());
    }

    #[tokio::test]
    async fn truncated_body_is_io_error() {
        let wire = sealed(&[b"hello".as_slice()]).await;
        let cut = &wire[..wire.len() - 1];
        let mut reader = SecureReader::new(cut, key(), StreamConfig::default());

        let err = reader.read_message().await.unwrap_err();
        assert!(matches!(&err, StreamError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn from_keys_matches_derived_session() {
        let alice = KeyPair::from_secret_bytes([1u8; 32]);
        let bob = KeyPair::from_secret_bytes([2u8; 32]);

        let mut writer =
            SecureWriter::from_keys(Vec::new(), &alice, bob.public_key(), StreamConfig::default())
                .unwrap();
        writer.write(b"keyed").await.unwrap();
        let wire = writer.into_inner();

        let mut reader =
            SecureReader::from_keys(
                wire.as_slice(),
                &bob,
                alice.public_key(),
                StreamConfig::default(),
            )
                .unwrap();
        assert_eq!(reader.read_message().await.unwrap(), b"keyed");
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
    }

    proptest! {
        #[test]
        fn message_sequences_survive_the_wire(
            messages in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..512),
                1..8,
            )
        ) {
            let received = block_on(async {
                let mut writer = SecureWriter::new(Vec::new(), key(), StreamConfig::default());
                for message in &messages {
                    writer.write(message).await.unwrap();
                }

                let wire = writer.into_inner();
                let mut reader = SecureReader::new(wire.as_slice(), key(), StreamConfig::default());
                let mut received = Vec::new();
                for _ in 0..messages.len() {
                    received.push(reader.read_message().await.unwrap());
                }
                received
            });
            prop_assert_eq!(received, messages);
        }

        #[test]
        fn any_flipped_byte_fails_the_read(
            message in proptest::collection::vec(any::<u8>(), 0..128),
            position in any::<prop::sample::Index>(),
            mask in 1u8..,
        ) {
            let result = block_on(async {
                let mut writer = SecureWriter::new(Vec::new(), key(), StreamConfig::default());
                writer.write(&message).await.unwrap();

                let mut wire = writer.into_inner();
                let index = position.index(wire.len());
                wire[index] ^= mask;

                let mut reader = SecureReader::new(wire.as_slice(), key(), StreamConfig::default());
                reader.read_message().await
            });
            prop_assert!(result.is_err());
        }
    }
}
