//! Minimal TCP transport serving one file as a streamed response.
//!
//! Every connection gets a single `HTTP/1.1` response with
//! `Connection: close`; the body ends when the connection is shut down.
//! The read half of the socket is watched after the request head has been
//! read, and its closing fires the sink's disconnect signal.
//!
//! A socket cannot tell a peer that left from one that only shut down its
//! write side, so a client half-closing after sending the request is taken
//! as disconnected and its download ends early. Clients must keep their
//! write side open until the response has been received.

pub mod connection;
pub mod listener;
