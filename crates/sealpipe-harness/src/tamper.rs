//! Outbound byte corruption.
//!
//! [`TamperWriter`] wraps a raw stream and XORs a mask into the byte at one
//! absolute offset of everything written through it. Reads pass through
//! untouched. Offsets count from the first byte written, handshake included:
//! an initiator's first frame body starts at offset 32 + 4.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll, ready},
};

use async_trait::async_trait;
use sealpipe_core::Connector;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

/// Stream wrapper that corrupts one outbound byte.
#[derive(Debug)]
pub struct TamperWriter<S> {
    inner: S,
    offset: u64,
    mask: u8,
    written: u64,
}

impl<S> TamperWriter<S> {
    /// Flip the bits of `mask` in the byte written at `offset`.
    pub fn new(inner: S, offset: u64, mask: u8) -> Self {
        Self { inner, offset, mask, written: 0 }
    }

    /// Total bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// True once the target byte has gone out.
    pub fn tampered(&self) -> bool {
        self.written > self.offset
    }

    fn target_in(&self, len: usize) -> Option<usize> {
        self.offset
            .checked_sub(self.written)
            .and_then(|delta| usize::try_from(delta).ok())
            .filter(|&index| index < len)
    }
}

impl<S> AsyncWrite for TamperWriter<S>
where
    S: AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;

        let n = match this.target_in(buf.len()) {
            Some(index) => {
                // Only the prefix up to and including the target may be
                // accepted, so a short write never skips the corruption
                let mut corrupted = buf[..=index].to_vec();
                corrupted[index] ^= this.mask;
                let n = ready!(Pin::new(&mut this.inner).poll_write(cx, &corrupted))?;
                if n > index {
                    debug!(offset = this.offset, "outbound byte corrupted");
                }
                n
            },
            None => ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?,
        };

        this.written += n as u64;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl<S> AsyncRead for TamperWriter<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Connector whose streams corrupt one outbound byte.
#[derive(Debug, Clone, Copy)]
pub struct TamperConnector<C> {
    inner: C,
    offset: u64,
    mask: u8,
}

impl<C> TamperConnector<C> {
    /// Wrap `inner`; every stream it opens flips `mask` at `offset`.
    pub fn new(inner: C, offset: u64, mask: u8) -> Self {
        Self { inner, offset, mask }
    }
}

#[async_trait]
impl<C> Connector for TamperConnector<C>
where
    C: Connector,
{
    type Stream = TamperWriter<C::Stream>;

    async fn connect(&self, remote: &str) -> io::Result<Self::Stream> {
        let stream = self.inner.connect(remote).await?;
        Ok(TamperWriter::new(stream, self.offset, self.mask))
    }
}
