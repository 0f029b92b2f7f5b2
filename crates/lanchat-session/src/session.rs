//! The session record: a registered client's identity plus its connection.

use std::fmt;
use std::sync::Arc;

use lanchat_protocol::Peer;
use lanchat_transport::Connection;

/// A single registered chat client.
///
/// Created when an Authorization exchange succeeds and destroyed exactly
/// once, when it is removed from the [`SessionRegistry`](crate::SessionRegistry).
/// The connection is shared with the receiver task reading it and the
/// sender task writing it; nobody else touches it.
pub struct Session<C> {
    /// Opaque unique id supplied by the client.
    pub id: String,
    /// Unique display name.
    pub nickname: String,
    /// The live transport bound to this session by the server.
    pub connection: Arc<C>,
}

impl<C> Session<C> {
    /// Binds a peer identity to a connection.
    pub fn new(peer: &Peer, connection: Arc<C>) -> Self {
        Self {
            id: peer.id.clone(),
            nickname: peer.nickname.clone(),
            connection,
        }
    }

    /// The identity as it appears on the wire.
    pub fn peer(&self) -> Peer {
        Peer::new(self.id.clone(), self.nickname.clone())
    }

    /// Whether both halves of the identity match.
    pub fn matches(&self, id: &str, nickname: &str) -> bool {
        self.id == id && self.nickname == nickname
    }

    /// Whether either half of the identity collides with `peer`.
    pub fn collides_with(&self, peer: &Peer) -> bool {
        self.id == peer.id || self.nickname == peer.nickname
    }
}

impl<C: Connection> Session<C> {
    /// Whether the underlying connection still reports connected.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

impl<C> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            nickname: self.nickname.clone(),
            connection: Arc::clone(&self.connection),
        }
    }
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}
