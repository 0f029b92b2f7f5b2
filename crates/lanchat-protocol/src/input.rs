//! Turning a line typed by a chat user into a [`Message`].
//!
//! The relay never parses user input itself, but clients and tests need
//! the same rules to produce well-formed frames:
//!
//! | input                 | message                                  |
//! |-----------------------|------------------------------------------|
//! | `Server.Time?`        | ServerQuery, content = the whole line    |
//! | `!bob:see you`        | Private to `bob`, content = `see you`    |
//! | anything else         | Broadcast, empty recipient               |

use crate::{
    Message, MessageType, Peer, ProtocolError, PRIVATE_MARKER,
    SERVER_QUERY_PREFIX,
};

/// Builds the Authorization request a client sends right after connecting.
pub fn authorization(sender: &Peer) -> Message {
    Message::new(MessageType::Authorization, sender.clone(), "", "")
}

/// Composes a message from one line of user input.
///
/// # Errors
/// Returns [`ProtocolError::InvalidMessage`] for blank input, a bare
/// `Server.` prefix, or a private message with no `:` or no recipient.
pub fn compose(sender: &Peer, line: &str) -> Result<Message, ProtocolError> {
    if line.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage("empty input".into()));
    }

    if line.starts_with(SERVER_QUERY_PREFIX) {
        if line == SERVER_QUERY_PREFIX {
            return Err(ProtocolError::InvalidMessage(
                "missing question for the server".into(),
            ));
        }
        return Ok(Message::new(
            MessageType::ServerQuery,
            sender.clone(),
            "",
            line,
        ));
    }

    if let Some(rest) = line.strip_prefix(PRIVATE_MARKER) {
        let (recipient, content) = rest.split_once(':').ok_or_else(|| {
            ProtocolError::InvalidMessage(
                "private message needs ':' between recipient and text".into(),
            )
        })?;
        if recipient.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "private message has no recipient".into(),
            ));
        }
        return Ok(Message::new(
            MessageType::Private,
            sender.clone(),
            recipient,
            content,
        ));
    }

    Ok(Message::new(MessageType::Broadcast, sender.clone(), "", line))
}
