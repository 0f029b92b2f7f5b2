//! Transport abstraction layer for LanChat.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the byte pipe underneath the relay. The relay engine only ever talks to
//! these traits, which is what lets its tests swap in an in-memory
//! connection.
//!
//! # Framing
//!
//! A connection moves whole frames: one `send` is one write, one `recv` is
//! one read. There is no length prefix, so a single read is assumed to hold
//! at most one message. Peers that coalesce writes (Nagle) or split a large
//! payload across reads break that assumption; the protocol layer discards
//! frames that do not look complete.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP transport via `tokio::net`

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::{TcpConnection, TcpTransport, DEFAULT_READ_BUFFER_SIZE};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// Stops listening. Pending and future `accept` calls fail, and new
    /// clients are refused by the OS instead of queueing.
    fn shutdown(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A single connection that can send and receive frames.
///
/// Implementations are shared between the task that reads them and the
/// task that writes them, so every method takes `&self`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Writes one frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Reads the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection: sends the half-close handshake and wakes any
    /// task parked in [`recv`](Self::recv), which then returns `Ok(None)`.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether the connection is still believed to be alive.
    ///
    /// Flips to `false` after the peer closes, after any I/O error, and
    /// after [`close`](Self::close). Never flips back.
    fn is_connected(&self) -> bool;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
