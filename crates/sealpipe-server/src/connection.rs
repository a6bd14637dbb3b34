//! Per-connection echo loop.

use sealpipe_core::handshake;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::{ServerConfig, error::ConnectionError};

/// Run the responder handshake on `stream`, then echo messages until the
/// peer closes the connection.
///
/// Returns the number of messages echoed.
///
/// # Errors
///
/// - [`ConnectionError::Handshake`] if the key exchange fails
/// - [`ConnectionError::Stream`] for any stream failure other than end of
///   stream, including a message that fails authentication or does not fit
///   the echo buffer
pub async fn echo<S>(stream: S, config: &ServerConfig) -> Result<u64, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut secure = handshake::respond(stream, config.stream).await?;
    debug!("handshake complete");

    let mut buf = vec![0u8; config.echo_buffer_size];
    let mut echoed = 0u64;

    loop {
        let n = match secure.read(&mut buf).await {
            Ok(n) => n,
            Err(err) if err.is_closed() => return Ok(echoed),
            Err(err) => return Err(err.into()),
        };

        secure.write(&buf[..n]).await?;
        echoed += 1;
        trace!(len = n, "message echoed");
    }
}

/// Task body for one accepted connection. Errors end here.
pub(crate) async fn serve<S>(stream: S, config: ServerConfig)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match echo(stream, &config).await {
        Ok(echoed) => debug!(echoed, "peer closed connection"),
        Err(err) => warn!(error = %err, "connection failed"),
    }
}
