//! # LanChat
//!
//! A relay server for chatting on a local network.
//!
//! Clients connect over TCP, authorize with an id and a nickname, and then
//! send JSON messages that the relay routes: broadcasts to everyone,
//! private messages to one nickname, and questions to the server itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lanchat::prelude::*;
//!
//! # async fn start() -> Result<(), LanChatError> {
//! lanchat::logging::init(lanchat::logging::DEFAULT_LOG_LEVEL);
//!
//! let server = RelayServer::builder()
//!     .bind("0.0.0.0:11000")
//!     .build()
//!     .await?;
//!
//! let stop = server.shutdown_token();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     stop.cancel();
//! });
//!
//! server.run().await
//! # }
//! ```
//!
//! ## Layers
//!
//! - [`lanchat_transport`]: bytes over TCP
//! - [`lanchat_protocol`]: the JSON message format
//! - [`lanchat_session`]: who is in the chat
//! - this crate: receivers, the [`Dispatcher`], the [`OutboundSender`],
//!   the [`Reaper`], and the [`RelayServer`] that runs them

pub mod commands;
mod config;
pub mod dispatcher;
mod error;
pub mod lifecycle;
pub mod logging;
pub mod queue;
pub mod reaper;
pub mod receiver;
pub mod sender;
mod server;
#[cfg(test)]
mod test_support;

pub use config::RelayConfig;
pub use dispatcher::Dispatcher;
pub use error::LanChatError;
pub use reaper::Reaper;
pub use receiver::Receiver;
pub use sender::{Delivery, OutboundSender};
pub use server::{RelayServer, RelayServerBuilder};

/// Everything needed to start a relay.
pub mod prelude {
    pub use crate::{LanChatError, RelayConfig, RelayServer, RelayServerBuilder};
    pub use lanchat_protocol::{Message, MessageType, Peer, DEFAULT_PORT};
}
