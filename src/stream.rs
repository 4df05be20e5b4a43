//! Streaming response bodies.
//!
//! [`Response::stream`] copies a source into the response body one chunk at
//! a time. Before each chunk the sink's disconnect signal is checked, and a
//! read still pending when the peer disconnects is abandoned. After every
//! chunk the sink can be flushed and the chunk size reported on a progress
//! channel.
//!
//! The source is closed by dropping it. This happens on every exit path
//! before the body writer returns: end of source, read or write error, and
//! disconnect. A disconnect is not an error; the body result is `Ok(())`.
//!
//! # Progress backpressure
//!
//! Reporting progress is a blocking handoff. A chunk is only written once
//! the channel has a free slot for its count, so with a channel of capacity
//! one the next chunk is not written until the consumer has received the
//! previous count. Larger channels buffer that many counts ahead of the
//! consumer. Reaching the end of the source never waits on the consumer.
//! A slow consumer slows the whole stream, and a consumer that never
//! receives stalls it once the channel is full. The channel is closed when
//! streaming ends, as long as the caller kept no other sender.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::http::error::BodyError;
use crate::http::response::{BodyWriter, BoxFuture, Response};
use crate::http::sink::{self, BodySink};

/// Default number of bytes moved per chunk (32 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Options for a streamed body.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    chunk_size: usize,
    flush_after_write: bool,
    progress: Option<mpsc::Sender<usize>>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            flush_after_write: false,
            progress: None,
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends the number of bytes written after every chunk.
    ///
    /// See the [module docs](self) for the backpressure this applies.
    pub fn with_progress(mut self, progress: mpsc::Sender<usize>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Flushes the sink after every chunk, if the sink supports it.
    pub fn with_flush(mut self) -> Self {
        self.flush_after_write = true;
        self
    }

    /// Sets the chunk size. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn flush_after_write(&self) -> bool {
        self.flush_after_write
    }
}

/// Body writer copying a source into the sink chunk by chunk.
#[derive(Debug)]
pub struct Stream<R> {
    source: R,
    config: StreamConfig,
}

impl<R> Stream<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(source: R, config: StreamConfig) -> Self {
        Self { source, config }
    }

    async fn run(self, sink: &mut dyn BodySink) -> Result<(), BodyError> {
        let Stream { mut source, config } = self;
        let mut progress = config.progress;
        let mut disconnect = sink.disconnect();
        let mut buffer = vec![0u8; config.chunk_size];
        let mut total = 0usize;

        let result = loop {
            if disconnect.as_ref().is_some_and(|d| d.is_disconnected()) {
                tracing::debug!(bytes = total, "Peer disconnected, stopping stream");
                break Ok(());
            }

            let read = match disconnect.as_mut() {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.disconnected() => {
                        tracing::debug!(bytes = total, "Peer disconnected during read, stopping stream");
                        break Ok(());
                    }
                    read = source.read(&mut buffer) => read,
                },
                None => source.read(&mut buffer).await,
            };

            let n = match read {
                Ok(0) => {
                    tracing::debug!(bytes = total, "Stream source exhausted");
                    break Ok(());
                }
                Ok(n) => n,
                Err(e) => break Err(BodyError::read(e)),
            };

            if progress.as_ref().is_some_and(|tx| tx.is_closed()) {
                tracing::debug!("Progress receiver dropped, no longer reporting");
                progress = None;
            }

            // Slot for this chunk's count; waits for the consumer when full.
            let permit = match &progress {
                Some(tx) => {
                    let reserved = match disconnect.as_mut() {
                        Some(signal) => tokio::select! {
                            biased;
                            _ = signal.disconnected() => {
                                tracing::debug!(bytes = total, "Peer disconnected during progress handoff, stopping stream");
                                break Ok(());
                            }
                            permit = tx.reserve() => permit,
                        },
                        None => tx.reserve().await,
                    };
                    reserved.ok()
                }
                None => None,
            };

            if disconnect.as_ref().is_some_and(|d| d.is_disconnected()) {
                tracing::debug!(bytes = total, "Peer disconnected, stopping stream");
                break Ok(());
            }

            if let Err(e) = sink::write_all(sink, &buffer[..n]).await {
                break Err(BodyError::write(e));
            }

            total += n;
            tracing::trace!(bytes = n, total, "Chunk written");

            if config.flush_after_write && sink.can_flush() {
                if let Err(e) = sink.flush().await {
                    break Err(BodyError::write(e));
                }
            }

            if let Some(permit) = permit {
                permit.send(n);
            }
        };

        drop(source);
        drop(progress);

        result
    }
}

impl<R> BodyWriter for Stream<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn write_body<'a>(self: Box<Self>, sink: &'a mut dyn BodySink) -> BoxFuture<'a, Result<(), BodyError>>
    where
        Self: 'a,
    {
        Box::pin((*self).run(sink))
    }
}

impl Response {
    /// Creates a response streaming `source` into the body.
    ///
    /// The source is dropped (closed) once it is exhausted, an error occurs,
    /// or the peer disconnects.
    pub fn stream<R>(source: R, config: StreamConfig) -> Response
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Response::new(Stream::new(source, config))
    }
}
