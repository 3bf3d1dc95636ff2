//! Per-connection session state.
//!
//! ADABRA players keep their identity client-side (a `playerId` generated
//! once and persisted in local storage) rather than receiving a
//! server-issued reconnection token, so unlike a generic session layer
//! this one carries no token or grace-period machinery: a `Session` is
//! just "what role is this WebSocket connection playing in which room,"
//! decided once at `joinRoom`/`rejoinRoom` time and held for the life of
//! the connection task.

use adabra_protocol::{PlayerId, RoomCode};

/// The role a connection plays within its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authenticated via a matching `hostKey`.
    Host,
    /// A regular player, identified by `playerId`.
    Player,
}

/// The server's record of one live WebSocket connection, owned by the
/// connection task (not shared — there is one `Session` per socket, even
/// when the same `playerId` has multiple tabs open).
#[derive(Debug, Clone)]
pub struct Session {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
    pub role: Role,
}

impl Session {
    pub fn new(room_code: RoomCode, player_id: PlayerId, role: Role) -> Self {
        tracing::debug!(room_code = %room_code, player_id = %player_id, role = ?role, "session created");
        Self {
            room_code,
            player_id,
            role,
        }
    }

    pub fn is_host(&self) -> bool {
        self.role == Role::Host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_host_reflects_role() {
        let host = Session::new(RoomCode("ABCD".into()), PlayerId("h1".into()), Role::Host);
        assert!(host.is_host());

        let player = Session::new(RoomCode("ABCD".into()), PlayerId("p1".into()), Role::Player);
        assert!(!player.is_host());
    }
}
