//! In-memory response sink.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use crate::http::headers::HeaderMap;
use crate::http::sink::{BodySink, Disconnect, ResponseSink};
use crate::http::status::StatusCode;

/// A [`ResponseSink`] that keeps everything written to it in memory.
///
/// Useful for tests, or to adapt a response in flight before handing it to
/// another transport.
#[derive(Debug, Default)]
pub struct CaptureSink {
    /// Status committed by `write_head`, if any.
    pub status: Option<StatusCode>,
    /// Captured body bytes.
    pub body: Vec<u8>,
    /// Number of write calls received.
    pub num_writes: usize,
    /// Number of flushes received.
    pub num_flushes: usize,
    headers: HeaderMap,
    chunk_size: usize,
    flushable: bool,
    disconnect: Option<Disconnect>,
}

impl CaptureSink {
    /// Creates a sink accepting at most `chunk_size` bytes per write call.
    /// A `chunk_size` of zero makes writes unbounded.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Reports explicit flush support, so streamed bodies flush into it.
    pub fn flushable(mut self) -> Self {
        self.flushable = true;
        self
    }

    /// Exposes `disconnect` as the sink's disconnect signal.
    pub fn with_disconnect(mut self, disconnect: Disconnect) -> Self {
        self.disconnect = Some(disconnect);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Status committed to the sink, defaulting to `200 OK` if the head was
    /// never written.
    pub fn status_or_default(&self) -> StatusCode {
        self.status.unwrap_or_default()
    }

    fn accept(&mut self, buf: &[u8]) -> usize {
        let n = match self.chunk_size {
            0 => buf.len(),
            max => buf.len().min(max),
        };

        self.num_writes += 1;
        self.body.extend_from_slice(&buf[..n]);
        n
    }
}

impl AsyncWrite for CaptureSink {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(self.get_mut().accept(buf)))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().num_flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl BodySink for CaptureSink {
    fn can_flush(&self) -> bool {
        self.flushable
    }

    fn disconnect(&self) -> Option<Disconnect> {
        self.disconnect.clone()
    }
}

impl ResponseSink for CaptureSink {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}
