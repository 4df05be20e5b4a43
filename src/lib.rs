//! Courier - Deferred HTTP Responses
//!
//! Build a response as a value, send it later. Bodies can be plain bytes or
//! streamed from any async reader, with disconnect handling, optional flush
//! after every chunk and progress reporting.

pub mod config;
pub mod http;
pub mod server;
pub mod stream;

pub use http::error::BodyError;
pub use http::headers::HeaderMap;
pub use http::response::{reconstruct, serialize, BodyWriter, Response};
pub use http::sink::{disconnect_channel, BodySink, Disconnect, DisconnectNotifier, ResponseSink};
pub use http::status::StatusCode;
pub use stream::StreamConfig;
