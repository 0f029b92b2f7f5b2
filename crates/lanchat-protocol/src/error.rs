//! Error types for the protocol layer.
//!
//! Each crate in LanChat defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning bytes into messages (or
//! back), not in networking or session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a message).
    ///
    /// Common causes: malformed JSON, missing required fields, or an
    /// unknown message type tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The bytes from a single read do not hold one whole message.
    ///
    /// Raised before any parsing is attempted, when the trimmed text does
    /// not start and end with the object delimiters (or is not UTF-8).
    #[error("incomplete frame ({0} bytes)")]
    IncompleteFrame(usize),

    /// The message is invalid at the protocol level.
    ///
    /// Used for client input that cannot be turned into a message, e.g. a
    /// private message without a recipient.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
