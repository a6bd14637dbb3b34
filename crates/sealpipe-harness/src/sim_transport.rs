//! Turmoil transports.
//!
//! Turmoil simulates TCP between named hosts inside one process, with
//! deterministic scheduling and virtual time. Hosts address each other by
//! name (`"server:7000"`).

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use sealpipe_core::{Acceptor, Connector};
use turmoil::net::{TcpListener, TcpStream};

/// Simulated TCP listener.
pub struct SimAcceptor {
    listener: TcpListener,
}

impl SimAcceptor {
    /// Bind on the current simulated host, e.g. `"0.0.0.0:7000"`.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        Ok(Self { listener: TcpListener::bind(addr).await? })
    }
}

#[async_trait]
impl Acceptor for SimAcceptor {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Simulated TCP dialer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimConnector;

#[async_trait]
impl Connector for SimConnector {
    type Stream = TcpStream;

    async fn connect(&self, remote: &str) -> io::Result<TcpStream> {
        TcpStream::connect(remote).await
    }
}
