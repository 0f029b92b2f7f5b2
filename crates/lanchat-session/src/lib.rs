//! Session bookkeeping for LanChat.
//!
//! A [`Session`] binds a client's self-declared identity (id + nickname) to
//! the connection it arrived on. The [`SessionRegistry`] is the one shared,
//! concurrently mutated table of who is in the chat.
//!
//! # How it fits in the stack
//!
//! ```text
//! Relay engine (above)  ← dispatcher, sender, and reaper share one registry
//!     ↕
//! Session layer (this crate)  ← identity ↔ connection, uniqueness
//!     ↕
//! Protocol + Transport (below)  ← Peer, Connection
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::Session;
