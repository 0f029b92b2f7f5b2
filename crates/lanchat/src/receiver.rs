//! Per-connection receiver: read, decode, enqueue.
//!
//! Each accepted connection gets its own Tokio task running a
//! [`Receiver`]. It never routes anything itself; it stamps each decoded
//! message with the connection it came from and hands it to the
//! dispatcher through the inbound queue.
//!
//! Frames that are not a whole message are dropped and the loop keeps
//! going. A closed or failed read ends the task and retires whatever
//! session was bound to the connection.

use std::sync::Arc;

use lanchat_protocol::{decode_frame, Codec};
use lanchat_session::SessionRegistry;
use lanchat_transport::Connection;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{self, Departure};
use crate::queue::Inbound;

/// Reads one connection until it closes or the server shuts down.
pub struct Receiver<C, K> {
    connection: Arc<C>,
    codec: K,
    registry: Arc<SessionRegistry<C>>,
}

impl<C: Connection, K: Codec> Receiver<C, K> {
    /// Creates a receiver for `connection`.
    pub fn new(connection: Arc<C>, codec: K, registry: Arc<SessionRegistry<C>>) -> Self {
        Self {
            connection,
            codec,
            registry,
        }
    }

    /// Runs the read loop.
    ///
    /// Returns when the peer closes, a read fails, the inbound queue is
    /// gone, or `shutdown` is cancelled. Only the first three retire the
    /// session; at shutdown the server closes every session itself.
    pub async fn run(self, inbound: mpsc::Sender<Inbound<C>>, shutdown: CancellationToken) {
        let conn_id = self.connection.id();
        tracing::debug!(%conn_id, "receiver started");

        loop {
            let data = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!(%conn_id, "receiver stopping for shutdown");
                    return;
                }
                read = self.connection.recv() => match read {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%conn_id, "connection closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                },
            };

            if data.is_empty() {
                continue;
            }

            let message = match decode_frame(&self.codec, &data) {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "discarding frame");
                    continue;
                }
            };

            let item = Inbound::new(message, Arc::clone(&self.connection));
            if inbound.send(item).await.is_err() {
                tracing::debug!(%conn_id, "inbound queue closed");
                break;
            }
        }

        if !shutdown.is_cancelled() {
            lifecycle::retire_connection(&self.registry, conn_id, Departure::Dropped).await;
        }
    }
}
