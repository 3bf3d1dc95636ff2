//! Command-authority table: who is allowed to send which [`ClientEvent`].
//!
//! Mirrors the three authority classes from the command list: host-only,
//! player-only, and either. `rejoinRoom` is the only "either" command —
//! everything else belongs to exactly one role.

use adabra_protocol::ClientEvent;

use crate::SessionError;
use crate::session::{Role, Session};

/// The role(s) permitted to send a given event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    HostOnly,
    PlayerOnly,
    Either,
}

/// Classifies an event by its required authority.
pub fn authority_of(event: &ClientEvent) -> Authority {
    use ClientEvent::*;
    match event {
        RejoinRoom { .. } => Authority::Either,

        SetTeam { .. }
        | SetTeamName { .. }
        | PlayerFocus { .. }
        | Buzz
        | FalseStartAttempt => Authority::PlayerOnly,

        HostSetTeamCount { .. }
        | HostSetDuration { .. }
        | HostNextRound
        | HostBeepStart
        | HostPauseTimer
        | HostCorrect
        | HostIncorrect
        | HostAdjustScore { .. }
        | HostSetFairPlay { .. }
        | HostUnblockFocus { .. }
        | HostRemoveTeam { .. }
        | HostEndRound => Authority::HostOnly,

        // joinRoom is handled before a Session exists; it has no authority
        // requirement of its own.
        JoinRoom { .. } => Authority::Either,
    }
}

/// Checks that `session`'s role is allowed to send `event`.
pub fn check_authority(session: &Session, event: &ClientEvent) -> Result<(), SessionError> {
    match (authority_of(event), session.role) {
        (Authority::Either, _) => Ok(()),
        (Authority::HostOnly, Role::Host) => Ok(()),
        (Authority::PlayerOnly, Role::Player) => Ok(()),
        (Authority::HostOnly, Role::Player) => Err(SessionError::NotAuthorized {
            player_id: session.player_id.clone(),
            reason: "host-only command".into(),
        }),
        (Authority::PlayerOnly, Role::Host) => Err(SessionError::NotAuthorized {
            player_id: session.player_id.clone(),
            reason: "player-only command".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adabra_protocol::{PlayerId, RoomCode, TeamId};

    fn host() -> Session {
        Session::new(RoomCode("ABCD".into()), PlayerId("h".into()), Role::Host)
    }

    fn player() -> Session {
        Session::new(RoomCode("ABCD".into()), PlayerId("p".into()), Role::Player)
    }

    #[test]
    fn host_can_beep_start() {
        assert!(check_authority(&host(), &ClientEvent::HostBeepStart).is_ok());
    }

    #[test]
    fn player_cannot_beep_start() {
        assert!(check_authority(&player(), &ClientEvent::HostBeepStart).is_err());
    }

    #[test]
    fn player_can_buzz() {
        assert!(check_authority(&player(), &ClientEvent::Buzz).is_ok());
    }

    #[test]
    fn host_cannot_buzz() {
        assert!(check_authority(&host(), &ClientEvent::Buzz).is_err());
    }

    #[test]
    fn either_role_can_rejoin() {
        let rejoin = ClientEvent::RejoinRoom {
            room_code: "ABCD".into(),
            player_id: PlayerId("p".into()),
        };
        assert!(check_authority(&host(), &rejoin).is_ok());
        assert!(check_authority(&player(), &rejoin).is_ok());
    }

    #[test]
    fn host_can_adjust_score() {
        let ev = ClientEvent::HostAdjustScore {
            team_id: TeamId("1".into()),
            delta: 1,
        };
        assert!(check_authority(&host(), &ev).is_ok());
        assert!(check_authority(&player(), &ev).is_err());
    }
}
