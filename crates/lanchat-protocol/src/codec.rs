//! Codec trait, the JSON implementation, and frame decoding.
//!
//! A "codec" converts between Rust types and raw bytes. The relay does not
//! care HOW messages are serialized, it only needs something that
//! implements [`Codec`]. The wire format in use today is JSON
//! ([`JsonCodec`]).
//!
//! [`decode_frame`] layers the framing rule on top: one read is one
//! message, and a read that is obviously not a whole object is dropped
//! before the codec ever sees it.

use serde::{de::DeserializeOwned, Serialize};

use crate::{Message, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// receiver task and the sender task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// Decodes the bytes of a single read into exactly one [`Message`].
///
/// The trimmed UTF-8 text must begin with `{` and end with `}`; anything
/// else is reported as [`ProtocolError::IncompleteFrame`] and should be
/// discarded by the caller. Two messages coalesced into one read pass the
/// delimiter check but fail to decode, so they are dropped as well.
pub fn decode_frame<C: Codec>(
    codec: &C,
    data: &[u8],
) -> Result<Message, ProtocolError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ProtocolError::IncompleteFrame(data.len()))?;
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return Err(ProtocolError::IncompleteFrame(data.len()));
    }
    codec.decode(trimmed.as_bytes())
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Non-ASCII text (nicknames, chat content) is written as raw UTF-8, not
/// `\u` escapes.
///
/// ```rust
/// use lanchat_protocol::{Codec, JsonCodec, Message, MessageType, Peer};
///
/// let codec = JsonCodec;
/// let msg = Message::new(
///     MessageType::Broadcast,
///     Peer::new("id-1", "alice"),
///     "",
///     "hi",
/// );
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{MessageType, Peer};

    fn sample() -> Message {
        Message::new(
            MessageType::Private,
            Peer::new("id-7", "alice"),
            "bob",
            "psst",
        )
    }

    #[test]
    fn test_decode_frame_accepts_whole_object() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        let decoded = decode_frame(&JsonCodec, &bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_decode_frame_tolerates_surrounding_whitespace() {
        let mut bytes = b"  \r\n".to_vec();
        bytes.extend(JsonCodec.encode(&sample()).unwrap());
        bytes.extend(b"\n");

        assert!(decode_frame(&JsonCodec, &bytes).is_ok());
    }

    #[test]
    fn test_decode_frame_rejects_truncated_read() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        let half = &bytes[..bytes.len() / 2];

        let result = decode_frame(&JsonCodec, half);

        assert!(matches!(result, Err(ProtocolError::IncompleteFrame(_))));
    }

    #[test]
    fn test_decode_frame_rejects_empty_read() {
        let result = decode_frame(&JsonCodec, b"   ");
        assert!(matches!(result, Err(ProtocolError::IncompleteFrame(3))));
    }

    #[test]
    fn test_decode_frame_rejects_invalid_utf8() {
        let result = decode_frame(&JsonCodec, &[b'{', 0xff, b'}']);
        assert!(matches!(result, Err(ProtocolError::IncompleteFrame(3))));
    }

    #[test]
    fn test_decode_frame_drops_coalesced_messages() {
        // Two frames in one read pass the delimiter check but are not a
        // single JSON value.
        let mut bytes = JsonCodec.encode(&sample()).unwrap();
        bytes.extend(JsonCodec.encode(&sample()).unwrap());

        let result = decode_frame(&JsonCodec, &bytes);

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_keeps_non_ascii_verbatim() {
        let msg = Message::new(
            MessageType::Broadcast,
            Peer::new("id", "Дима"),
            "",
            "привет",
        );
        let bytes = JsonCodec.encode(&msg).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("привет"));
        assert!(!text.contains("\\u"));
    }
}
