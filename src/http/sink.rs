//! Destinations a response is written to.
//!
//! A sink is any [`AsyncWrite`] that additionally exposes a header surface
//! and a status commit ([`ResponseSink`]). Explicit flush and the disconnect
//! signal are optional capabilities queried through [`BodySink`].

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

use crate::http::headers::HeaderMap;
use crate::http::status::StatusCode;

/// Body half of a sink: the byte writer plus its optional capabilities.
pub trait BodySink: AsyncWrite + Unpin + Send {
    /// Whether the sink forwards explicit flushes to the peer.
    fn can_flush(&self) -> bool {
        false
    }

    /// The peer disconnect signal, if the transport provides one.
    fn disconnect(&self) -> Option<Disconnect> {
        None
    }
}

/// A sink able to receive a complete response.
pub trait ResponseSink: BodySink {
    /// Headers that will be sent when the status is committed.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and headers. Header changes made afterwards
    /// are not sent.
    fn write_head(&mut self, status: StatusCode);
}

/// Creates a linked disconnect notifier and signal.
///
/// The transport keeps the notifier; sinks hand out clones of the signal.
pub fn disconnect_channel() -> (DisconnectNotifier, Disconnect) {
    let (tx, rx) = watch::channel(false);
    (DisconnectNotifier { tx }, Disconnect { rx })
}

/// Transport side of the disconnect signal.
#[derive(Debug)]
pub struct DisconnectNotifier {
    tx: watch::Sender<bool>,
}

impl DisconnectNotifier {
    /// Reports that the peer went away. Repeated calls have no further effect.
    pub fn notify(&self) {
        self.tx.send_replace(true);
    }

    /// A new signal observing this notifier.
    pub fn subscribe(&self) -> Disconnect {
        Disconnect {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of the disconnect signal.
///
/// If the notifier is dropped without calling
/// [`notify`](DisconnectNotifier::notify), no disconnect is ever reported.
#[derive(Debug, Clone)]
pub struct Disconnect {
    rx: watch::Receiver<bool>,
}

impl Disconnect {
    pub fn is_disconnected(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the peer has disconnected.
    pub async fn disconnected(&mut self) {
        if self.rx.wait_for(|gone| *gone).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Body half of a borrowed [`ResponseSink`], usable when the sink type is
/// only known as a trait object.
pub(crate) struct BodyOf<'a, S: ?Sized>(pub(crate) &'a mut S);

impl<S> AsyncWrite for BodyOf<'_, S>
where
    S: ResponseSink + ?Sized,
{
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Pin::new(&mut *self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.0).poll_shutdown(cx)
    }
}

impl<S> BodySink for BodyOf<'_, S>
where
    S: ResponseSink + ?Sized,
{
    fn can_flush(&self) -> bool {
        self.0.can_flush()
    }

    fn disconnect(&self) -> Option<Disconnect> {
        self.0.disconnect()
    }
}

/// Writes all of `data`, retrying partial writes.
///
/// A sink accepting zero bytes is reported as [`io::ErrorKind::WriteZero`].
pub async fn write_all<W>(sink: &mut W, data: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;

    while written < data.len() {
        let n = sink.write(&data[written..]).await?;

        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "connection closed while writing",
            ));
        }

        written += n;
    }

    Ok(())
}
