//! Error types for the session layer.

use adabra_protocol::PlayerId;

/// Errors that can occur while validating a connection's role or its
/// authority to send a given command.
///
/// Kicked players aren't a `SessionError` case — `kickedPlayers` lives on
/// the room and is checked by the room actor itself, which replies with
/// `kicked` directly instead of routing through this layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The room named in `joinRoom`/`rejoinRoom` does not exist.
    #[error("room {0} does not exist")]
    RoomNotFound(String),

    /// The connection's role is not permitted to send this command.
    #[error("player {player_id} is not authorized: {reason}")]
    NotAuthorized { player_id: PlayerId, reason: String },
}
