//! Errors raised by the byte pipe under the relay.

use std::io;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone, or the connection was closed on our side.
    #[error("{0} is closed")]
    ConnectionClosed(String),

    /// Writing a frame failed; the connection is considered dead.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Reading a frame failed; the connection is considered dead.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// Binding the listener or accepting a client failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    /// `accept` was called after the listener was shut down.
    #[error("listener is shut down")]
    Shutdown,
}
