//! Unified error type for the LanChat relay.

use lanchat_protocol::ProtocolError;
use lanchat_session::SessionError;
use lanchat_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Per-message and per-connection failures never reach this type: they
/// are logged or answered with a reply message where they happen. What
/// does surface here is fatal to starting or running the server itself,
/// such as failing to bind the listener.
#[derive(Debug, thiserror::Error)]
pub enum LanChatError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, framing).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (duplicate identity, connection already bound).
    #[error(transparent)]
    Session(#[from] SessionError),
}
