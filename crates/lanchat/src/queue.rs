//! The items that travel through the inbound and outbound queues.
//!
//! ```text
//! Receiver ──Inbound──▶ Dispatcher ──Outbound──▶ Sender
//! ```
//!
//! Both queues are bounded `mpsc` channels with a single consumer, so FIFO
//! order per producer is preserved without any locking on the items.

use std::sync::Arc;

use lanchat_protocol::Message;

/// A decoded message together with the connection it arrived on.
///
/// The connection is bound by the receiver, never taken from the client:
/// whatever identity the message claims, this is the socket it came from.
pub struct Inbound<C> {
    /// The decoded message.
    pub message: Message,
    /// The live connection the message was read from.
    pub connection: Arc<C>,
}

impl<C> Inbound<C> {
    /// Pairs a message with its source connection.
    pub fn new(message: Message, connection: Arc<C>) -> Self {
        Self {
            message,
            connection,
        }
    }
}

/// How the sender finds the connection to write to.
pub enum Route<C> {
    /// Look up the session named in `message.recipient_nickname`.
    Recipient,
    /// Write to this exact connection. Used for replies to clients that
    /// are not (or not yet) registered, whose nickname may not resolve to
    /// them.
    Direct(Arc<C>),
}

/// A message ready to be written to exactly one recipient.
pub struct Outbound<C> {
    /// The message to send.
    pub message: Message,
    /// Where to send it.
    pub route: Route<C>,
}

impl<C> Outbound<C> {
    /// Routes by the message's recipient nickname.
    pub fn to_recipient(message: Message) -> Self {
        Self {
            message,
            route: Route::Recipient,
        }
    }

    /// Routes straight to a connection.
    pub fn direct(message: Message, connection: Arc<C>) -> Self {
        Self {
            message,
            route: Route::Direct(connection),
        }
    }

    /// Whether this item bypasses the nickname lookup.
    pub fn is_direct(&self) -> bool {
        matches!(self.route, Route::Direct(_))
    }
}
