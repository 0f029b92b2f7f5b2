//! The dispatcher: the one place routing and authorization rules live.
//!
//! A single dispatcher task drains the inbound queue, so every routing
//! decision is made in enqueue order by one consumer. For each message it
//!
//! 1. rejects anything but Authorization from a sender that is not a
//!    registered, connected session (replying "you are not here"),
//! 2. then branches on the message type:
//!    - **Authorization** → register, or reject a duplicate identity
//!    - **ServerQuery** → sign off, or answer from the command table
//!    - **Private** → forward unchanged, or report the recipient absent
//!    - **Broadcast** → one copy per registered session, sender included
//!
//! Logic errors never escape as `Err`; each one becomes a reply message.

use std::sync::Arc;

use lanchat_protocol::{Message, MessageType, Peer, ACK_OK, ACK_REJECTED, SIGN_OFF};
use lanchat_session::{Session, SessionError, SessionRegistry};
use lanchat_transport::Connection;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{self, CommandContext};
use crate::lifecycle::{self, Departure};
use crate::queue::{Inbound, Outbound};

/// Reply to a ServerQuery that matches no command.
pub const UNKNOWN_COMMAND_REPLY: &str =
    "My young brain could not parse that question and gave up.";

/// Applies routing rules to inbound messages and produces outbound ones.
pub struct Dispatcher<C> {
    registry: Arc<SessionRegistry<C>>,
    server: Peer,
}

impl<C: Connection> Dispatcher<C> {
    /// Creates a dispatcher replying as `server`.
    pub fn new(registry: Arc<SessionRegistry<C>>, server: Peer) -> Self {
        Self { registry, server }
    }

    /// Drains `inbound` until every producer is gone, forwarding results
    /// to `outbound`.
    ///
    /// Dropping the last inbound producer is the shutdown signal: whatever
    /// is still queued is dispatched first, then `outbound` is dropped so
    /// the sender can drain in turn.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<Inbound<C>>,
        outbound: mpsc::Sender<Outbound<C>>,
    ) {
        debug!("dispatcher started");
        while let Some(item) = inbound.recv().await {
            for out in self.dispatch(item).await {
                if outbound.send(out).await.is_err() {
                    warn!("outbound queue closed, dispatcher stopping");
                    return;
                }
            }
        }
        debug!("dispatcher drained");
    }

    /// Routes one inbound message. Returns the messages to send, in order.
    pub async fn dispatch(&self, inbound: Inbound<C>) -> Vec<Outbound<C>> {
        let Inbound {
            message,
            connection,
        } = inbound;

        if message.kind != MessageType::Authorization
            && !self.registry.is_live(&message.sender).await
        {
            debug!(
                sender = %message.sender,
                kind = %message.kind,
                "rejecting message from unregistered sender"
            );
            let reply = message.reply(
                &self.server,
                MessageType::ServerQuery,
                format!("Sorry, {}, but you are not here!", message.sender.nickname),
            );
            return vec![Outbound::direct(reply, connection)];
        }

        match message.kind {
            MessageType::Authorization => self.authorize(message, connection).await,
            MessageType::ServerQuery => self.answer(message).await,
            MessageType::Private => self.forward(message).await,
            MessageType::Broadcast => self.fan_out(message).await,
        }
    }

    async fn authorize(
        &self,
        message: Message,
        connection: Arc<C>,
    ) -> Vec<Outbound<C>> {
        let nickname = message.sender.nickname.clone();

        // A signed-off or dropped connection can still have frames in
        // flight. Nothing can be written back, so there is no reply.
        if !connection.is_connected() {
            debug!(%nickname, conn_id = %connection.id(), "ignoring authorization on a closed connection");
            return Vec::new();
        }

        if nickname.trim().is_empty() || message.sender.id.is_empty() {
            let reply = message.reply(
                &self.server,
                MessageType::Authorization,
                format!("{ACK_REJECTED}A nickname and an id are required"),
            );
            return vec![Outbound::direct(reply, connection)];
        }

        let session = Session::new(&message.sender, Arc::clone(&connection));
        let content = match self.registry.add(session).await {
            Ok(()) => {
                info!(%nickname, conn_id = %connection.id(), "joined the chat");
                format!(
                    "{ACK_OK}Welcome {nickname}, you are in the chat. Available commands:{}",
                    commands::command_list()
                )
            }
            Err(SessionError::DuplicateIdentity { .. }) => {
                debug!(%nickname, "rejecting duplicate identity");
                format!(
                    "{ACK_REJECTED}A user with the same nickname or id is already in the chat"
                )
            }
            Err(SessionError::ConnectionBound { nickname: current, .. }) => {
                debug!(%nickname, %current, "rejecting second sign-in on one connection");
                format!("{ACK_REJECTED}This connection is already in the chat as {current}")
            }
        };

        let reply = message.reply(&self.server, MessageType::Authorization, content);
        vec![Outbound::direct(reply, connection)]
    }

    async fn answer(&self, message: Message) -> Vec<Outbound<C>> {
        if message.content == SIGN_OFF {
            lifecycle::retire(
                &self.registry,
                &message.sender.id,
                &message.sender.nickname,
                Departure::SignedOff,
            )
            .await;
            return Vec::new();
        }

        let content = match commands::lookup(&message.content).and_then(|c| c.respond) {
            Some(respond) => {
                let ctx = CommandContext::new(self.registry.snapshot().await);
                respond(&ctx)
            }
            None => {
                debug!(sender = %message.sender, query = %message.content, "unknown command");
                UNKNOWN_COMMAND_REPLY.to_string()
            }
        };

        let reply = message.reply(&self.server, MessageType::ServerQuery, content);
        vec![Outbound::to_recipient(reply)]
    }

    async fn forward(&self, message: Message) -> Vec<Outbound<C>> {
        if self
            .registry
            .contains_nickname(&message.recipient_nickname)
            .await
        {
            return vec![Outbound::to_recipient(message)];
        }

        let reply = message.reply(
            &self.server,
            MessageType::ServerQuery,
            format!(
                "Recipient [{}] is not among the registered users",
                message.recipient_nickname
            ),
        );
        vec![Outbound::to_recipient(reply)]
    }

    async fn fan_out(&self, message: Message) -> Vec<Outbound<C>> {
        self.registry
            .snapshot()
            .await
            .into_iter()
            .map(|nickname| Outbound::to_recipient(message.addressed_to(nickname)))
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
