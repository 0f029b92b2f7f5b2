//! Core protocol types for LanChat's wire format.
//!
//! Every frame on the wire is one [`Message`] serialized as a JSON object:
//!
//! ```text
//! {
//!   "Type": "Private",
//!   "Sender": { "Id": "6f1c…", "NickName": "alice" },
//!   "RecipientNickName": "bob",
//!   "Content": "see you at lunch"
//! }
//! ```
//!
//! The field names follow the protocol that existing clients already speak,
//! which is why they are renamed explicitly rather than derived.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

/// The TCP port the relay listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 11000;

/// Every server-directed command starts with this prefix.
pub const SERVER_QUERY_PREFIX: &str = "Server.";

/// The sign-off sentinel: a ServerQuery with this content means
/// "I am leaving".
pub const SIGN_OFF: &str = "Server.Bye";

/// Help text shown for [`SIGN_OFF`] in the command list.
pub const SIGN_OFF_HELP: &str = "Leave the chat";

/// Marks client input as a private message: `!recipient:content`.
pub const PRIVATE_MARKER: char = '!';

/// Prefix of a successful Authorization reply.
pub const ACK_OK: &str = "Ok/";

/// Prefix of a rejected Authorization reply.
pub const ACK_REJECTED: &str = "No/";

// ---------------------------------------------------------------------------
// MessageType
// ---------------------------------------------------------------------------

/// What a message is for, and therefore how the relay routes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageType {
    /// Client → Server: "register me under this nickname".
    /// Server → Client: the `Ok/` or `No/` acknowledgement.
    Authorization,
    /// Delivered to every registered session, the sender included.
    Broadcast,
    /// A literal server command, or the server's reply to anything.
    ServerQuery,
    /// Delivered to the single session named in `RecipientNickName`.
    Private,
}

impl MessageType {
    const ALL: [MessageType; 4] = [
        MessageType::Authorization,
        MessageType::Broadcast,
        MessageType::ServerQuery,
        MessageType::Private,
    ];

    /// The literal tag written on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Authorization => "Authorization",
            MessageType::Broadcast => "Broadcast",
            MessageType::ServerQuery => "ServerQuery",
            MessageType::Private => "Private",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Authorization" => Some(MessageType::Authorization),
            "Broadcast" | "All" => Some(MessageType::Broadcast),
            "ServerQuery" | "Server" => Some(MessageType::ServerQuery),
            "Private" => Some(MessageType::Private),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Older clients send the legacy tags ("All", "Server") or the numeric
// encoding (0..=3), so decoding accepts all three spellings.
impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        struct TypeVisitor;

        impl Visitor<'_> for TypeVisitor {
            type Value = MessageType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a message type tag or an integer 0..=3")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MessageType, E> {
                MessageType::from_tag(v).ok_or_else(|| {
                    E::unknown_variant(
                        v,
                        &["Authorization", "Broadcast", "ServerQuery", "Private"],
                    )
                })
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MessageType, E> {
                usize::try_from(v)
                    .ok()
                    .and_then(|i| MessageType::ALL.get(i).copied())
                    .ok_or_else(|| {
                        E::invalid_value(de::Unexpected::Unsigned(v), &self)
                    })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MessageType, E> {
                match u64::try_from(v) {
                    Ok(u) => self.visit_u64(u),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(TypeVisitor)
    }
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// The identity stamped on a message: who sent it.
///
/// This is a copy of the sender's `id` and `nickname`, not a live handle to
/// their session. The relay checks it against the registry before routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// Opaque unique id, chosen by the client when it first authorizes.
    #[serde(rename = "Id")]
    pub id: String,
    /// Self-declared display name; unique among active sessions.
    #[serde(rename = "NickName")]
    pub nickname: String,
}

impl Peer {
    /// Creates a peer identity.
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.nickname)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The one and only frame type on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// How the relay should route this message.
    #[serde(rename = "Type")]
    pub kind: MessageType,

    /// Who sent it.
    #[serde(rename = "Sender")]
    pub sender: Peer,

    /// Empty for a Broadcast coming from a client; set on every message
    /// the relay delivers.
    #[serde(
        rename = "RecipientNickName",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub recipient_nickname: String,

    /// The text itself.
    #[serde(rename = "Content", default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl Message {
    /// Creates a message from its parts.
    pub fn new(
        kind: MessageType,
        sender: Peer,
        recipient_nickname: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            sender,
            recipient_nickname: recipient_nickname.into(),
            content: content.into(),
        }
    }

    /// Builds a server reply to whoever sent `self`.
    pub fn reply(
        &self,
        server: &Peer,
        kind: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self::new(kind, server.clone(), self.sender.nickname.clone(), content)
    }

    /// A copy of this message with only the recipient replaced.
    pub fn addressed_to(&self, nickname: impl Into<String>) -> Self {
        Self {
            recipient_nickname: nickname.into(),
            ..self.clone()
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// =========================================================================
// Tests
// =========================================================================
