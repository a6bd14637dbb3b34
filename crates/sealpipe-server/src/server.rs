//! Accept loop.
//!
//! One task per accepted connection, held in a [`JoinSet`] so finished tasks
//! are reaped as the loop runs and unfinished ones are aborted on shutdown.
//! Accept errors that belong to a single pending connection are logged and
//! skipped; any other accept error stops the loop.

use std::{io, net::SocketAddr};

use sealpipe_core::{Acceptor, TcpAcceptor};
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{ServerConfig, connection, error::ServerError};

/// Echo server over an [`Acceptor`].
#[derive(Debug)]
pub struct Server<A> {
    acceptor: A,
    config: ServerConfig,
}

impl Server<TcpAcceptor> {
    /// Validate `config` and bind a TCP listener on `config.listen`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let acceptor = TcpAcceptor::bind(config.listen)
            .await
            .map_err(|source| ServerError::Bind { addr: config.listen, source })?;
        Ok(Self { acceptor, config })
    }
}

impl<A> Server<A>
where
    A: Acceptor,
{
    /// Serve connections from `acceptor`. `config.listen` is ignored.
    pub fn new(acceptor: A, config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        Ok(Self { acceptor, config })
    }

    /// Address the acceptor is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Active configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves or the listener fails.
    ///
    /// Either way, connection tasks still running are aborted before this
    /// returns.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        info!(addr = ?self.acceptor.local_addr().ok(), "server listening");

        let result = loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(active = tasks.len(), "shutdown requested");
                    break Ok(());
                }
                accepted = self.acceptor.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) if is_connection_error(&err) => {
                            warn!(error = %err, "dropping connection that failed during accept");
                            continue;
                        },
                        Err(err) => {
                            error!(error = %err, "accept failed");
                            break Err(ServerError::Accept(err));
                        },
                    };

                    debug!(%peer, "connection accepted");
                    let span = info_span!("connection", %peer);
                    tasks.spawn(connection::serve(stream, self.config).instrument(span));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
            }
        };

        tasks.shutdown().await;
        result
    }
}

/// Errors scoped to one pending connection. The listener is still usable.
fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}

fn reap(joined: Result<(), JoinError>) {
    if let Some(err) = joined.err().filter(JoinError::is_panic) {
        error!(error = %err, "connection task panicked");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use sealpipe_core::{StreamConfig, handshake::initiate};
    use tokio::{
        io::{DuplexStream, duplex},
        sync::{Mutex, mpsc},
    };

    use super::*;

    /// Hands out whatever the test queues, in order.
    struct QueuedAcceptor {
        queue: Mutex<mpsc::UnboundedReceiver<io::Result<DuplexStream>>>,
    }

    #[async_trait]
    impl Acceptor for QueuedAcceptor {
        type Stream = DuplexStream;

        async fn accept(&self) -> io::Result<(DuplexStream, SocketAddr)> {
            let peer = SocketAddr::from(([127, 0, 0, 1], 4000));
            match self.queue.lock().await.recv().await {
                Some(next) => next.map(|stream| (stream, peer)),
                None => std::future::pending().await,
            }
        }

        fn local_addr(&self) -> io::Result<SocketAddr> {
            Ok(SocketAddr::from(([127, 0, 0, 1], 0)))
        }
    }

    type Queue = mpsc::UnboundedSender<io::Result<DuplexStream>>;

    fn queued_server() -> (Queue, Server<QueuedAcceptor>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let acceptor = QueuedAcceptor { queue: Mutex::new(rx) };
        (tx, Server::new(acceptor, ServerConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn aborted_accept_is_skipped() {
        let (queue, server) = queued_server();
        let handle = tokio::spawn(server.run());

        queue.send(Err(io::ErrorKind::ConnectionAborted.into())).unwrap();
        let (client_end, server_end) = duplex(64 * 1024);
        queue.send(Ok(server_end)).unwrap();

        let mut client = initiate(client_end, StreamConfig::default()).await.unwrap();
        client.write(b"after abort").await.unwrap();
        assert_eq!(client.read_message().await.unwrap(), b"after abort");
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn reset_and_interrupted_accepts_are_skipped() {
        let (queue, server) = queued_server();
        let handle = tokio::spawn(server.run());

        queue.send(Err(io::ErrorKind::ConnectionReset.into())).unwrap();
        queue.send(Err(io::ErrorKind::Interrupted.into())).unwrap();
        let (client_end, server_end) = duplex(64 * 1024);
        queue.send(Ok(server_end)).unwrap();

        let mut client = initiate(client_end, StreamConfig::default()).await.unwrap();
        client.write(b"still up").await.unwrap();
        assert_eq!(client.read_message().await.unwrap(), b"still up");

        handle.abort();
    }

    #[tokio::test]
    async fn listener_failure_stops_server() {
        let (queue, server) = queued_server();
        queue.send(Err(io::Error::other("listener closed"))).unwrap();

        let err = server.run().await.unwrap_err();
        assert!(matches!(err, ServerError::Accept(_)));
    }

    #[test]
    fn connection_scoped_errors() {
        assert!(is_connection_error(&io::ErrorKind::ConnectionAborted.into()));
        assert!(is_connection_error(&io::ErrorKind::ConnectionReset.into()));
        assert!(is_connection_error(&io::ErrorKind::Interrupted.into()));
        assert!(!is_connection_error(&io::ErrorKind::InvalidInput.into()));
        assert!(!is_connection_error(&io::Error::other("emfile")));
    }
}
