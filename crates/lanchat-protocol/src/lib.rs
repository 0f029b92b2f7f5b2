//! Wire protocol for LanChat.
//!
//! This crate defines the "language" that chat clients and the relay speak:
//!
//! - **Types** ([`Message`], [`MessageType`], [`Peer`]): the one frame
//!   type that travels on the wire, plus the wire constants.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`], [`decode_frame`]): how
//!   messages are converted to and from the bytes of a single read/write.
//! - **Input** ([`input::compose`]): how a line of user input becomes a
//!   message.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (raw bytes) and the relay
//! engine. It knows nothing about connections or sessions.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Relay (routing)
//! ```

mod codec;
mod error;
pub mod input;
mod types;

pub use codec::{decode_frame, Codec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Message, MessageType, Peer, ACK_OK, ACK_REJECTED, DEFAULT_PORT,
    PRIVATE_MARKER, SERVER_QUERY_PREFIX, SIGN_OFF, SIGN_OFF_HELP,
};
