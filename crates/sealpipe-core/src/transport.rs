//! Raw stream capabilities.
//!
//! The handshake and secure stream only need a reliable, ordered,
//! bidirectional byte stream. These traits abstract over where it comes from:
//! TCP in production, Turmoil's simulated TCP or in-memory duplex pipes in
//! tests.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tracing::warn;

/// Source of inbound raw streams.
#[async_trait]
pub trait Acceptor: Send + Sync + 'static {
    /// Raw stream type produced by [`Acceptor::accept`].
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next inbound connection.
    async fn accept(&self) -> io::Result<(Self::Stream, SocketAddr)>;

    /// Address this acceptor is bound to.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Opens outbound raw streams.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Raw stream type produced by [`Connector::connect`].
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `remote` (`host:port`).
    async fn connect(&self, remote: &str) -> io::Result<Self::Stream>;
}

/// TCP listener.
#[derive(Debug)]
pub struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    /// Bind a listener on `addr`. Port 0 picks an ephemeral port.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self { listener: TcpListener::bind(addr).await? })
    }

    /// Wrap an already bound listener.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener }
    }
}

#[async_trait]
impl Acceptor for TcpAcceptor {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        if let Err(err) = stream.set_nodelay(true) {
            warn!(%peer, error = %err, "failed to set TCP_NODELAY");
        }
        Ok((stream, peer))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// TCP dialer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, remote: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(remote).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn tcp_loopback_carries_bytes() {
        let acceptor = TcpAcceptor::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = acceptor.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = acceptor.accept().await.unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).await.unwrap();
            buf
        });

        let mut client = TcpConnector.connect(&addr.to_string()).await.unwrap();
        client.write_all(b"raw!").await.unwrap();

        assert_eq!(&server.await.unwrap(), b"raw!");
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(TcpConnector.connect(&addr.to_string()).await.is_err());
    }
}
