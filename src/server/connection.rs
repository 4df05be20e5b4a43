use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use anyhow::Context as _;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::Config;
use crate::http::headers::HeaderMap;
use crate::http::response::Response;
use crate::http::sink::{BodySink, Disconnect, DisconnectNotifier, ResponseSink, disconnect_channel};
use crate::http::status::StatusCode;
use crate::http::writer::serialize_head;
use crate::stream::StreamConfig;

/// Largest request head accepted before the connection is dropped.
const MAX_HEAD_SIZE: usize = 16 * 1024;

/// [`ResponseSink`] writing an HTTP/1.1 response to a byte stream.
///
/// The committed head is buffered and sent ahead of the first body bytes,
/// or on flush / shutdown for an empty body.
pub struct ConnectionSink<W> {
    writer: W,
    headers: HeaderMap,
    head: Vec<u8>,
    head_sent: usize,
    committed: bool,
    disconnect: Option<Disconnect>,
}

impl<W> ConnectionSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            headers: HeaderMap::new(),
            head: Vec::new(),
            head_sent: 0,
            committed: false,
            disconnect: None,
        }
    }

    pub fn with_disconnect(mut self, disconnect: Disconnect) -> Self {
        self.disconnect = Some(disconnect);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn poll_send_head(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.committed {
            self.write_head(StatusCode::OK);
        }

        while self.head_sent < self.head.len() {
            let n = ready!(Pin::new(&mut self.writer).poll_write(cx, &self.head[self.head_sent..]))?;

            if n == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing head",
                )));
            }

            self.head_sent += n;
        }

        Poll::Ready(Ok(()))
    }
}

impl<W> AsyncWrite for ConnectionSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_send_head(cx))?;
        Pin::new(&mut this.writer).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_send_head(cx))?;
        Pin::new(&mut this.writer).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_send_head(cx))?;
        Pin::new(&mut this.writer).poll_shutdown(cx)
    }
}

impl<W> BodySink for ConnectionSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn can_flush(&self) -> bool {
        true
    }

    fn disconnect(&self) -> Option<Disconnect> {
        self.disconnect.clone()
    }
}

impl<W> ResponseSink for ConnectionSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        if self.committed {
            return;
        }

        self.committed = true;
        self.head = serialize_head(status, &self.headers);
    }
}

/// Reads one request head and answers it with the configured file.
pub async fn serve(stream: TcpStream, cfg: &Config) -> anyhow::Result<()> {
    let (mut reader, writer) = stream.into_split();

    if !read_request_head(&mut reader).await? {
        // Client closed connection
        return Ok(());
    }

    let (notifier, disconnect) = disconnect_channel();
    let watcher = tokio::spawn(watch_disconnect(reader, notifier));

    let mut sink = ConnectionSink::new(writer).with_disconnect(disconnect);
    let mut response = file_response(cfg).await;
    response
        .set_header("Connection", "close")
        .add_callback(|err| match err {
            Some(e) => tracing::warn!(error = %e, "Body transfer failed"),
            None => tracing::debug!("Body transfer finished"),
        });

    response.write_to(&mut sink).await;
    watcher.abort();

    if let Err(e) = sink.shutdown().await {
        tracing::debug!(error = %e, "Shutdown after response failed");
    }

    Ok(())
}

async fn file_response(cfg: &Config) -> Response {
    let file = match File::open(&cfg.file).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(file = %cfg.file.display(), error = %e, "Cannot open served file");
            return Response::empty(StatusCode::NOT_FOUND);
        }
    };

    let len = file.metadata().await.ok().map(|meta| meta.len());

    let mut response = Response::stream(file, StreamConfig::from(&cfg.stream));
    response.set_header("Content-Type", cfg.content_type.as_str());

    if let Some(len) = len {
        response.set_header("Content-Length", len.to_string());
    }

    response
}

/// Reads until the blank line ending a request head. Returns `false` if the
/// peer closed the connection first.
pub async fn read_request_head<R>(reader: &mut R) -> anyhow::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(1024);

    loop {
        if find_headers_end(&buffer).is_some() {
            return Ok(true);
        }

        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("request head larger than {} bytes", MAX_HEAD_SIZE);
        }

        // Read more data
        let mut temp = [0u8; 1024];
        let n = reader.read(&mut temp).await.context("failed to read request")?;

        if n == 0 {
            return Ok(false);
        }

        buffer.extend_from_slice(&temp[..n]);
    }
}

/// Fires `notifier` once the peer stops sending: EOF or a read error.
async fn watch_disconnect<R>(mut reader: R, notifier: DisconnectNotifier)
where
    R: AsyncRead + Unpin,
{
    let mut discard = [0u8; 512];

    loop {
        match reader.read(&mut discard).await {
            Ok(0) | Err(_) => {
                tracing::debug!("Peer closed connection");
                notifier.notify();
                return;
            }
            Ok(_) => {}
        }
    }
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
