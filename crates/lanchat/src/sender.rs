//! The sender: the only task that writes to client connections.
//!
//! Drains the outbound queue in order. Each item is resolved to a
//! connection (by route) and written once; there are no retries. A failed
//! write means the client is gone, so its session is retired on the spot
//! instead of waiting for the reaper.

use std::sync::Arc;

use lanchat_protocol::Codec;
use lanchat_session::SessionRegistry;
use lanchat_transport::Connection;
use tokio::sync::mpsc;

use crate::lifecycle::{self, Departure};
use crate::queue::{Outbound, Route};

/// What happened to one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written; the server was the author.
    ServerReply,
    /// Written; relayed from one client to another.
    PeerToPeer,
    /// Not written: the recipient is absent or already disconnected.
    Dropped,
    /// The write failed and the recipient's session was retired.
    Failed,
}

/// Writes outbound messages to their recipients.
pub struct OutboundSender<C, K> {
    registry: Arc<SessionRegistry<C>>,
    codec: K,
    server_id: String,
}

impl<C: Connection, K: Codec> OutboundSender<C, K> {
    /// Creates a sender. `server_id` tells server replies apart from
    /// relayed traffic in the logs.
    pub fn new(registry: Arc<SessionRegistry<C>>, codec: K, server_id: impl Into<String>) -> Self {
        Self {
            registry,
            codec,
            server_id: server_id.into(),
        }
    }

    /// Drains `outbound` until the dispatcher drops its end.
    pub async fn run(self, mut outbound: mpsc::Receiver<Outbound<C>>) {
        tracing::debug!("sender started");
        while let Some(item) = outbound.recv().await {
            self.deliver(item).await;
        }
        tracing::debug!("sender drained");
    }

    /// Writes one message to exactly one connection.
    pub async fn deliver(&self, item: Outbound<C>) -> Delivery {
        let Outbound { message, route } = item;
        let recipient = &message.recipient_nickname;

        let connection = match route {
            Route::Direct(connection) => connection,
            Route::Recipient => match self.registry.find_by_nickname(recipient).await {
                Some(session) => session.connection,
                None => {
                    tracing::warn!(%recipient, "recipient is not in the chat, dropping message");
                    return Delivery::Dropped;
                }
            },
        };

        if !connection.is_connected() {
            tracing::warn!(%recipient, conn_id = %connection.id(), "recipient disconnected, dropping message");
            return Delivery::Dropped;
        }

        let bytes = match self.codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%recipient, error = %e, "failed to encode message");
                return Delivery::Dropped;
            }
        };

        if let Err(e) = connection.send(&bytes).await {
            tracing::warn!(%recipient, error = %e, "send failed, retiring session");
            lifecycle::retire_connection(&self.registry, connection.id(), Departure::Dropped)
                .await;
            return Delivery::Failed;
        }

        if message.sender.id == self.server_id {
            tracing::info!(%recipient, "server reply delivered");
            Delivery::ServerReply
        } else {
            tracing::info!(from = %message.sender, %recipient, "peer-to-peer message delivered");
            Delivery::PeerToPeer
        }
    }
}
