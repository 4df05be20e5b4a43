//! Deferred HTTP responses.
//!
//! A [`Response`](response::Response) describes what should be sent: status,
//! headers and a body writer. Nothing touches the transport until the
//! response is handed a sink with `write_to`, which sends it exactly once.
//!
//! # Architecture
//!
//! - **`response`**: the response envelope, body writers, `serialize` / `reconstruct`
//! - **`sink`**: the capability traits a transport implements, and the disconnect signal
//! - **`headers`**: ordered, case-insensitive header multimap
//! - **`status`**: status codes and reason phrases
//! - **`decorate`**: wrapping the body sink with a caller-supplied writer
//! - **`capture`**: in-memory sink
//! - **`writer`**: HTTP/1.1 head serialization for socket transports
//! - **`error`**: body phase errors
//!
//! # Response Lifecycle
//!
//! ```text
//!        ┌──────────────────┐
//!        │    Unwritten     │ ← set status / headers / callbacks
//!        └──────┬───────────┘
//!               │ write_to(sink)
//!               ▼
//!        ┌──────────────────┐
//!        │   Head commit    │ ← headers copied into the sink, status committed
//!        └──────┬───────────┘
//!               │
//!               ▼
//!        ┌──────────────────┐
//!        │   Body writer    │ ← runs once, yields Ok or a BodyError
//!        └──────┬───────────┘
//!               │ result handed to every callback, in order
//!               ▼
//!        ┌──────────────────┐
//!        │     Written      │ ← terminal; a second write_to panics
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use courier::http::capture::CaptureSink;
//! use courier::http::response::Response;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut response = Response::respond("Hello from Courier\n");
//! response.add_callback(|err| {
//!     if let Some(err) = err {
//!         eprintln!("body failed: {}", err);
//!     }
//! });
//!
//! let mut sink = CaptureSink::new(0);
//! response.write_to(&mut sink).await;
//! assert_eq!(sink.body, b"Hello from Courier\n");
//! # }
//! ```

pub mod capture;
pub mod decorate;
pub mod error;
pub mod headers;
pub mod response;
pub mod sink;
pub mod status;
pub mod writer;
