//! Writer decoration.
//!
//! A decorator wraps the sink handed to the body writer, e.g. to encode
//! the body on the fly. The decorated writer keeps the disconnect signal and
//! flush capability of the sink it wraps.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::error::BodyError;
use crate::http::response::{BodyWriter, BoxFuture};
use crate::http::sink::{BodySink, Disconnect};

/// Boxed writer returned by a [`WriterDecorator`].
pub type DecoratedWriter<'a> = Box<dyn AsyncWrite + Unpin + Send + 'a>;

/// Wraps the body sink of a response.
///
/// The returned writer is shut down after the body has been written, so
/// buffered output (trailers, final blocks) can be emitted there.
pub trait WriterDecorator: Send {
    fn decorate<'a>(self: Box<Self>, sink: &'a mut dyn BodySink) -> DecoratedWriter<'a>;
}

pub(crate) struct Decorated {
    base: Option<Box<dyn BodyWriter>>,
    decorator: Box<dyn WriterDecorator>,
}

impl Decorated {
    pub(crate) fn new(base: Option<Box<dyn BodyWriter>>, decorator: Box<dyn WriterDecorator>) -> Self {
        Self { base, decorator }
    }
}

impl BodyWriter for Decorated {
    fn write_body<'a>(self: Box<Self>, sink: &'a mut dyn BodySink) -> BoxFuture<'a, Result<(), BodyError>>
    where
        Self: 'a,
    {
        Box::pin(async move {
            let Decorated { base, decorator } = *self;

            let disconnect = sink.disconnect();
            let can_flush = sink.can_flush();
            let mut decorated = DecoratedSink {
                writer: decorator.decorate(sink),
                disconnect,
                can_flush,
            };

            let result = match base {
                Some(writer) => writer.write_body(&mut decorated).await,
                None => Ok(()),
            };

            let finished = decorated.writer.shutdown().await;

            match (result, finished) {
                (Err(e), _) => Err(e),
                (Ok(()), Err(e)) => Err(BodyError::finish(e)),
                (Ok(()), Ok(())) => Ok(()),
            }
        })
    }
}

struct DecoratedSink<'a> {
    writer: DecoratedWriter<'a>,
    disconnect: Option<Disconnect>,
    can_flush: bool,
}

impl AsyncWrite for DecoratedSink<'_> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.writer).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_shutdown(cx)
    }
}

impl BodySink for DecoratedSink<'_> {
    fn can_flush(&self) -> bool {
        self.can_flush
    }

    fn disconnect(&self) -> Option<Disconnect> {
        self.disconnect.clone()
    }
}
