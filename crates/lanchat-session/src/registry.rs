//! The session registry: the authoritative set of active sessions.
//!
//! # Concurrency
//!
//! The registry is mutated from several places at once: the dispatcher adds
//! and removes on join/sign-off, the reaper evicts dead sessions, and the
//! receiver and sender tasks retire sessions whose transport failed. Every
//! operation takes one registry-wide lock for exactly the duration of that
//! operation and never across I/O. The container itself is never handed
//! out; callers get clones of sessions or nickname snapshots.
//!
//! Removal returns the removed session, so when two call sites race to
//! retire the same session exactly one of them gets `Some` and performs the
//! teardown.

use lanchat_protocol::Peer;
use lanchat_transport::{Connection, ConnectionId};
use tokio::sync::Mutex;

use crate::{Session, SessionError};

/// Shared table of active sessions, in join order.
pub struct SessionRegistry<C> {
    /// Insertion-ordered; join order is observable through
    /// [`snapshot`](Self::snapshot). Chat rooms are small, so linear scans
    /// are fine.
    sessions: Mutex<Vec<Session<C>>>,
}

impl<C: Connection> SessionRegistry<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Registers a session.
    ///
    /// A connection carries at most one session, so retiring "the session
    /// on this connection" always has a single answer.
    ///
    /// # Errors
    /// The registry is left unchanged and
    /// - [`SessionError::DuplicateIdentity`] is returned if a session with
    ///   the same nickname or the same id is already registered,
    /// - [`SessionError::ConnectionBound`] if the connection already
    ///   carries a session.
    pub async fn add(&self, session: Session<C>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        let peer = session.peer();
        if sessions.iter().any(|s| s.collides_with(&peer)) {
            return Err(SessionError::DuplicateIdentity {
                nickname: peer.nickname,
                id: peer.id,
            });
        }
        let conn_id = session.connection.id();
        if let Some(bound) = sessions.iter().find(|s| s.connection.id() == conn_id) {
            return Err(SessionError::ConnectionBound {
                conn_id,
                nickname: bound.nickname.clone(),
            });
        }
        tracing::debug!(nickname = %session.nickname, "session registered");
        sessions.push(session);
        Ok(())
    }

    /// Removes the session matching both `id` and `nickname`.
    ///
    /// Returns the removed session, or `None` if nothing matched. A
    /// mismatch is not an error: the session may already have been retired
    /// by someone else.
    pub async fn remove(&self, id: &str, nickname: &str) -> Option<Session<C>> {
        let mut sessions = self.sessions.lock().await;
        let index = sessions.iter().position(|s| s.matches(id, nickname))?;
        Some(sessions.remove(index))
    }

    /// Removes the session bound to the given connection, if any. There is
    /// never more than one; [`add`](Self::add) enforces that.
    pub async fn remove_connection(
        &self,
        conn_id: ConnectionId,
    ) -> Option<Session<C>> {
        let mut sessions = self.sessions.lock().await;
        let index = sessions
            .iter()
            .position(|s| s.connection.id() == conn_id)?;
        Some(sessions.remove(index))
    }

    /// Looks up a session by nickname.
    pub async fn find_by_nickname(&self, nickname: &str) -> Option<Session<C>> {
        self.sessions
            .lock()
            .await
            .iter()
            .find(|s| s.nickname == nickname)
            .cloned()
    }

    /// Whether a session with this nickname is registered.
    pub async fn contains_nickname(&self, nickname: &str) -> bool {
        self.sessions
            .lock()
            .await
            .iter()
            .any(|s| s.nickname == nickname)
    }

    /// Whether `peer` is registered under exactly this id and nickname and
    /// its connection is still up.
    pub async fn is_live(&self, peer: &Peer) -> bool {
        self.sessions
            .lock()
            .await
            .iter()
            .any(|s| s.matches(&peer.id, &peer.nickname) && s.is_connected())
    }

    /// Point-in-time copy of every registered nickname, in join order.
    pub async fn snapshot(&self) -> Vec<String> {
        self.sessions
            .lock()
            .await
            .iter()
            .map(|s| s.nickname.clone())
            .collect()
    }

    /// Sessions whose connection reports not-connected.
    pub async fn disconnected(&self) -> Vec<Session<C>> {
        self.sessions
            .lock()
            .await
            .iter()
            .filter(|s| !s.is_connected())
            .cloned()
            .collect()
    }

    /// Removes and returns every session. Used at shutdown.
    pub async fn drain(&self) -> Vec<Session<C>> {
        std::mem::take(&mut *self.sessions.lock().await)
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no sessions are registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl<C: Connection> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
