//! Session retirement: the single path by which a session leaves.
//!
//! Sign-off, reaping, and transport failures all end up here. Removal goes
//! through the registry lock and only the caller that actually removed the
//! entry tears the connection down, so a session is destroyed at most once
//! even when a sign-off and a sweep race each other.

use lanchat_session::{Session, SessionRegistry};
use lanchat_transport::{Connection, ConnectionId};
use tracing::{debug, info};

/// Why a session is leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The client sent the sign-off command.
    SignedOff,
    /// The connection was found dead; the client never said goodbye.
    Dropped,
}

/// Retires the session registered under exactly `id` and `nickname`.
///
/// Returns `true` if this call removed it.
pub async fn retire<C: Connection>(
    registry: &SessionRegistry<C>,
    id: &str,
    nickname: &str,
    departure: Departure,
) -> bool {
    match registry.remove(id, nickname).await {
        Some(session) => {
            finish(session, departure).await;
            true
        }
        None => {
            info!(%nickname, ?departure, "asked to leave but was not in the chat");
            false
        }
    }
}

/// Retires whichever session is bound to `conn_id`, if any.
///
/// Returns `true` if this call removed one. Connections that never
/// authorized have nothing to retire.
pub async fn retire_connection<C: Connection>(
    registry: &SessionRegistry<C>,
    conn_id: ConnectionId,
    departure: Departure,
) -> bool {
    match registry.remove_connection(conn_id).await {
        Some(session) => {
            finish(session, departure).await;
            true
        }
        None => false,
    }
}

async fn finish<C: Connection>(session: Session<C>, departure: Departure) {
    let nickname = &session.nickname;
    match departure {
        Departure::SignedOff => {
            if let Err(e) = session.connection.close().await {
                debug!(%nickname, error = %e, "close after sign-off failed");
            }
            info!(%nickname, "signed off");
        }
        Departure::Dropped => {
            // Already dead: no shutdown handshake. The socket is released
            // once the last handle to it goes away.
            info!(%nickname, "dropped (connection lost)");
        }
    }
}
