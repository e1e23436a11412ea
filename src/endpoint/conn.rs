//! # Accepted connections.
//!
//! [`Connection`] is what the meta listener hands to callers: a boxed async
//! byte stream plus the local/peer addresses and the id of the source
//! listener that accepted it. It implements [`AsyncRead`] and
//! [`AsyncWrite`] by delegating to the underlying stream, so callers can
//! use it wherever a socket is expected.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::addr::EndpointAddr;

/// Byte-stream bound required of every accepted connection.
pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Stream for T {}

/// Boxed transport stream.
pub type BoxStream = Box<dyn Stream>;

/// A connection received from one of the managed listeners.
pub struct Connection {
    stream: BoxStream,
    local: EndpointAddr,
    peer: EndpointAddr,
    source: String,
}

impl Connection {
    /// Wraps a raw stream with its addresses.
    ///
    /// The source id is attached by the worker that forwards the
    /// connection into the aggregate.
    pub fn new(stream: BoxStream, local: EndpointAddr, peer: EndpointAddr) -> Self {
        Self {
            stream,
            local,
            peer,
            source: String::new(),
        }
    }

    /// Local address of the connection.
    pub fn local_addr(&self) -> &EndpointAddr {
        &self.local
    }

    /// Remote peer address.
    pub fn peer_addr(&self) -> &EndpointAddr {
        &self.peer
    }

    /// Id of the source listener that accepted this connection.
    ///
    /// Empty until the connection has passed through the fan-in channel.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Unwraps the underlying stream, discarding the metadata.
    pub fn into_stream(self) -> BoxStream {
        self.stream
    }

    pub(crate) fn set_source(&mut self, id: &str) {
        self.source = id.to_string();
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("local", &self.local)
            .field("peer", &self.peer)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
