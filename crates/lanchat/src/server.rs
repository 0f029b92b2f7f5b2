//! `RelayServer` builder and the accept loop.
//!
//! This is the entry point for running a LanChat relay. It wires the
//! layers together:
//!
//! ```text
//!            ┌─ Receiver ─┐
//! Acceptor ──┼─ Receiver ─┼──▶ inbound ──▶ Dispatcher ──▶ outbound ──▶ Sender
//!            └─ Receiver ─┘                     │
//!                                         SessionRegistry ◀── Reaper
//! ```
//!
//! One task per connection reads; exactly one task routes and exactly one
//! task writes. Everything is stopped by a single [`CancellationToken`].

use std::net::SocketAddr;
use std::sync::Arc;

use lanchat_protocol::{JsonCodec, Peer, DEFAULT_PORT};
use lanchat_session::SessionRegistry;
use rand::Rng;
use lanchat_transport::{Connection, TcpConnection, TcpTransport, Transport};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::reaper::Reaper;
use crate::receiver::Receiver;
use crate::sender::OutboundSender;
use crate::{LanChatError, RelayConfig};

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,no_run
/// use lanchat::prelude::*;
///
/// # async fn start() -> Result<(), LanChatError> {
/// let server = RelayServer::builder()
///     .bind("0.0.0.0:11000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    config: RelayConfig,
    server_name: Option<String>,
}

impl RelayServerBuilder {
    /// Creates a builder listening on every interface at the default port.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            config: RelayConfig::default(),
            server_name: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the relay configuration.
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the nickname the server signs its replies with.
    ///
    /// Defaults to `Server-<hostname>`.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Binds the listener and prepares the server. Nothing is accepted
    /// until [`RelayServer::run`] is called.
    ///
    /// # Errors
    /// Returns [`LanChatError::Transport`] if the address cannot be bound.
    pub async fn build(self) -> Result<RelayServer, LanChatError> {
        let config = self.config.validated();
        let transport = TcpTransport::bind(&self.bind_addr)
            .await?
            .with_read_buffer_size(config.read_buffer_size);

        let name = self.server_name.unwrap_or_else(default_server_name);
        let identity = Peer::new(server_id(), name);
        tracing::debug!(server = %identity, id = %identity.id, "server identity chosen");

        Ok(RelayServer {
            transport,
            config,
            identity,
            registry: Arc::new(SessionRegistry::new()),
            shutdown: CancellationToken::new(),
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The relay's own id: 128 random bits as 32 hex digits. Client ids are
/// self-declared and never minted here.
fn server_id() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}

fn default_server_name() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".into());
    format!("Server-{host}")
}

/// A bound relay server.
///
/// Call [`run()`](Self::run) to start accepting connections, and cancel
/// the [`shutdown_token`](Self::shutdown_token) to stop it.
pub struct RelayServer {
    transport: TcpTransport,
    config: RelayConfig,
    identity: Peer,
    registry: Arc<SessionRegistry<TcpConnection>>,
    shutdown: CancellationToken,
}

impl RelayServer {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// A handle that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The id and nickname the server signs its replies with.
    pub fn identity(&self) -> &Peer {
        &self.identity
    }

    /// The live session registry.
    pub fn registry(&self) -> Arc<SessionRegistry<TcpConnection>> {
        Arc::clone(&self.registry)
    }

    /// The effective (validated) configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Runs the relay until the shutdown token is cancelled.
    ///
    /// Shutdown is ordered so nothing already read is lost: receivers stop
    /// first, the dispatcher drains the inbound queue, the sender drains
    /// the outbound queue, and only then are the remaining sessions closed.
    pub async fn run(mut self) -> Result<(), LanChatError> {
        let config = self.config.clone();
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_capacity);

        let dispatcher = tokio::spawn(
            Dispatcher::new(Arc::clone(&self.registry), self.identity.clone())
                .run(inbound_rx, outbound_tx),
        );
        let sender = tokio::spawn(
            OutboundSender::new(Arc::clone(&self.registry), JsonCodec, self.identity.id.clone())
                .run(outbound_rx),
        );
        let reaper = tokio::spawn(
            Reaper::new(Arc::clone(&self.registry), config.sweep_interval, config.sweep_every)
                .run(self.shutdown.clone()),
        );

        tracing::info!(
            server = %self.identity,
            addr = %self.transport.local_addr(),
            max_connections = config.max_connections,
            "LanChat relay running"
        );

        let limit = Arc::new(Semaphore::new(config.max_connections));
        let mut receivers = JoinSet::new();

        loop {
            // Hold a slot before accepting so a full server stops taking
            // connections instead of taking and dropping them.
            let permit = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                permit = Arc::clone(&limit).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let accepted = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                accepted = self.transport.accept() => accepted,
            };

            match accepted {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    tracing::info!(conn_id = %conn.id(), peer = %conn.peer_addr(), "client connected");
                    let receiver = Receiver::new(conn, JsonCodec, Arc::clone(&self.registry));
                    let inbound = inbound_tx.clone();
                    let shutdown = self.shutdown.clone();
                    receivers.spawn(async move {
                        receiver.run(inbound, shutdown).await;
                        drop(permit);
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }

            while let Some(done) = receivers.try_join_next() {
                if let Err(e) = done {
                    tracing::warn!(error = %e, "receiver task failed");
                }
            }
        }

        tracing::info!("LanChat relay shutting down");
        if let Err(e) = self.transport.shutdown().await {
            tracing::debug!(error = %e, "transport shutdown failed");
        }

        while let Some(done) = receivers.join_next().await {
            if let Err(e) = done {
                tracing::warn!(error = %e, "receiver task failed");
            }
        }

        drop(inbound_tx);
        for (task, handle) in [("dispatcher", dispatcher), ("sender", sender), ("reaper", reaper)] {
            if let Err(e) = handle.await {
                tracing::error!(task, error = %e, "relay task failed");
            }
        }

        for session in self.registry.drain().await {
            if let Err(e) = session.connection.close().await {
                tracing::debug!(nickname = %session.nickname, error = %e, "close at shutdown failed");
            }
        }

        tracing::info!("LanChat relay stopped");
        Ok(())
    }
}
