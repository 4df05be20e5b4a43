use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::http::capture::CaptureSink;
use crate::http::decorate::{Decorated, WriterDecorator};
use crate::http::error::BodyError;
use crate::http::headers::HeaderMap;
use crate::http::sink::{self, BodyOf, BodySink, ResponseSink};
use crate::http::status::StatusCode;

/// Boxed future returned by [`BodyWriter::write_body`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback observing the outcome of the body phase.
pub type Callback = Box<dyn FnOnce(Option<&BodyError>) + Send>;

/// Produces the body of a response once the status and headers have been
/// committed.
///
/// The writer is consumed by the call, so it runs at most once.
pub trait BodyWriter: Send {
    fn write_body<'a>(self: Box<Self>, sink: &'a mut dyn BodySink) -> BoxFuture<'a, Result<(), BodyError>>
    where
        Self: 'a;
}

/// In-memory body written in full.
#[derive(Debug, Clone)]
pub struct Full {
    data: Bytes,
}

impl Full {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl BodyWriter for Full {
    fn write_body<'a>(self: Box<Self>, sink: &'a mut dyn BodySink) -> BoxFuture<'a, Result<(), BodyError>>
    where
        Self: 'a,
    {
        Box::pin(async move {
            sink::write_all(sink, &self.data)
                .await
                .map_err(BodyError::write)
        })
    }
}

/// A response waiting to be written.
///
/// Status, headers and callbacks can be changed until [`write_to`] is
/// called; a response can only be written once.
///
/// # Example
///
/// ```
/// use courier::http::capture::CaptureSink;
/// use courier::http::response::Response;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut response = Response::respond("hello");
/// response
///     .set_header("Content-Type", "text/plain")
///     .add_callback(|err| if let Some(err) = err { eprintln!("{err}") });
///
/// let mut sink = CaptureSink::new(0);
/// response.write_to(&mut sink).await;
/// assert_eq!(sink.headers().get("Content-Type"), Some("text/plain"));
/// # }
/// ```
///
/// [`write_to`]: Response::write_to
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    writer: Option<Box<dyn BodyWriter>>,
    callbacks: Vec<Callback>,
    written: bool,
}

impl Response {
    /// Creates a `200 OK` response whose body is produced by `writer`.
    pub fn new(writer: impl BodyWriter + 'static) -> Self {
        Self::from_writer(Some(Box::new(writer)))
    }

    /// Creates a `200 OK` response without a body.
    pub fn without_body() -> Self {
        Self::from_writer(None)
    }

    fn from_writer(writer: Option<Box<dyn BodyWriter>>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            writer,
            callbacks: Vec::new(),
            written: false,
        }
    }

    /// Creates a response writing `data`, with `Content-Length` set to its
    /// length.
    pub fn respond(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len();

        let mut response = Self::new(Full::new(data));
        response.set_header("Content-Length", len.to_string());
        response
    }

    /// Creates an empty response with the given status code.
    pub fn empty(status: StatusCode) -> Self {
        let mut response = Self::respond(Bytes::new());
        response.set_status(status);
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of the header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_written(&self) -> bool {
        self.written
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Replaces every value of the header. An empty value removes it.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();

        if value.is_empty() {
            self.headers.remove(name);
        } else {
            self.headers.set(name, value);
        }

        self
    }

    /// Adds another value to the header.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.append(name, value);
        self
    }

    /// Registers a callback invoked after the body has been written, with
    /// the body error if one occurred.
    ///
    /// Callbacks run once each, in registration order, and are the only way
    /// to learn whether sending the body failed.
    pub fn add_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnOnce(Option<&BodyError>) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Wraps the sink handed to the body writer with `decorator`.
    ///
    /// The decorated writer is shut down once the body has been written.
    /// Decorations stack; the last one added wraps the sink directly.
    pub fn decorate_writer(&mut self, decorator: impl WriterDecorator + 'static) -> &mut Self {
        let base = self.writer.take();
        self.writer = Some(Box::new(Decorated::new(base, Box::new(decorator))));
        self
    }

    /// Writes the status, headers and body to `sink`, then runs the
    /// callbacks.
    ///
    /// # Panics
    ///
    /// Panics if the response was already written.
    pub async fn write_to<S>(&mut self, sink: &mut S)
    where
        S: ResponseSink + ?Sized,
    {
        if self.written {
            panic!("response was already written");
        }

        self.written = true;
        self.write_head(sink);

        let result = match self.writer.take() {
            Some(writer) => writer.write_body(&mut BodyOf(sink)).await,
            None => Ok(()),
        };

        if let Err(e) = &result {
            tracing::debug!(status = self.status.as_u16(), error = %e, "Response body failed");
        }

        for callback in self.callbacks.drain(..) {
            callback(result.as_ref().err());
        }
    }

    fn write_head<S: ResponseSink + ?Sized>(&self, sink: &mut S) {
        let headers = sink.headers_mut();
        for (name, values) in &self.headers {
            headers.set_all(name, values.to_vec());
        }

        sink.write_head(self.status);
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.writer.is_some())
            .field("callbacks", &self.callbacks.len())
            .field("written", &self.written)
            .finish()
    }
}

/// Writes `response` into an unbounded [`CaptureSink`] and returns the sink
/// along with the body result.
pub async fn serialize(mut response: Response) -> (CaptureSink, Result<(), BodyError>) {
    let (tx, mut rx) = oneshot::channel();
    response.add_callback(move |err| {
        let _ = tx.send(err.cloned());
    });

    let mut sink = CaptureSink::new(0);
    response.write_to(&mut sink).await;

    let result = match rx.try_recv() {
        Ok(Some(err)) => Err(err),
        _ => Ok(()),
    };

    (sink, result)
}

/// Rebuilds a plain response from values captured by [`serialize`].
///
/// Only the captured headers are carried over; `Content-Length` is not added
/// if the capture had none.
pub fn reconstruct(status: StatusCode, headers: &HeaderMap, body: impl Into<Bytes>) -> Response {
    let mut response = Response::new(Full::new(body));
    response.set_status(status);

    for (name, values) in headers {
        if let Some((first, rest)) = values.split_first() {
            response.set_header(name, first.as_str());

            for value in rest {
                response.add_header(name, value.as_str());
            }
        }
    }

    response
}
