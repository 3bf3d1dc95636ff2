//! Error types for the room layer.

use adabra_protocol::TeamId;

/// Command-validation and lifecycle errors a room transition can produce.
///
/// These map onto the two error tiers: most variants become an
/// `errorMsg` sent back to the sender; [`RoomError::GameOver`] carries
/// the exact copy the interface specifies. Room lookup itself isn't a
/// `RoomError` case — it's a `roomCode -> Option<RoomHandle>` lookup at
/// the registry, reported as `SessionError::RoomNotFound` one layer up.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Game is over. Create a new room.")]
    GameOver,

    #[error("team count must be between 2 and 6")]
    TeamCountOutOfRange,

    #[error("team count cannot decrease")]
    TeamCountDecreased,

    #[error("round duration must be between 1 and 600 seconds")]
    DurationOutOfRange,

    #[error("team name must be between 2 and 16 characters")]
    TeamNameLength,

    #[error("team name can only be set once")]
    TeamNameAlreadyLocked,

    #[error("score adjustment must be between -100 and 100")]
    ScoreDeltaOutOfRange,

    #[error("unknown team {0}")]
    UnknownTeam(TeamId),

    #[error("team {0} is already taken")]
    TeamAlreadyTaken(TeamId),

    #[error("you have not joined a team")]
    NoTeamOwned,

    #[error("the room's command channel is unavailable")]
    Unavailable,
}

/// Registry-level error: allocation only. Lookup is `Option`-returning
/// (`getRoom(code) -> Room | null`), so there is no "not found" case here.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("could not allocate a free room code")]
    CodeSpaceExhausted,
}
