//! Error types for the session layer.

use lanchat_transport::ConnectionId;

/// Reasons a session cannot be registered.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session with the same nickname or the same id is already
    /// registered. Nicknames and ids are both unique keys.
    #[error("nickname {nickname:?} or id {id:?} is already in use")]
    DuplicateIdentity {
        /// The nickname that was offered.
        nickname: String,
        /// The id that was offered.
        id: String,
    },

    /// The connection already carries a session.
    #[error("{conn_id} is already signed in as {nickname:?}")]
    ConnectionBound {
        /// The connection the request arrived on.
        conn_id: ConnectionId,
        /// Who is signed in on it.
        nickname: String,
    },
}
