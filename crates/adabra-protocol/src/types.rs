//! Wire types: identifiers, the client/server event sums, and the public
//! room view broadcast after every mutating transition.
//!
//! Unlike a generic transport protocol carrying an opaque `Payload::Game(Vec<u8>)`
//! blob, ADABRA has exactly one message domain, so the two-level
//! envelope/payload tagging a pluggable framework needs collapses into a
//! single flat, tagged sum per direction: [`ClientEvent`] and [`ServerEvent`].
//! Each variant's `event` field is the wire name from the interface list;
//! serde's internally-tagged representation keeps the JSON shape
//! `{"event": "buzz", ...fields}` a plain JS client expects.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A player identity, generated and persisted client-side. Stable across
/// reconnects and page refreshes; never re-issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room code: four characters drawn from the unambiguous alphabet
/// `ABCDEFGHJKLMNPQRSTUVWXYZ23456789` (no `0`/`O`/`1`/`I`). Lookups are
/// case-insensitive; the canonical form stored here is uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Normalizes into the canonical uppercase form used for lookups.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A team identity: one of `"1"` through `"6"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TeamId {
    /// Builds the team id for a 1-based team ordinal (1..=6).
    pub fn from_ordinal(n: u32) -> Self {
        Self(n.to_string())
    }
}

// ---------------------------------------------------------------------------
// Round phase
// ---------------------------------------------------------------------------

/// The three states of the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Between rounds. No timer. A buzz here is a false start.
    Lobby,
    /// Timer running. First valid buzz wins.
    Armed,
    /// A team is answering. Timer paused.
    Locked,
}

// ---------------------------------------------------------------------------
// buzzRejected reasons
// ---------------------------------------------------------------------------

/// Why a `buzz` was rejected instead of accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuzzRejectReason {
    /// The sender has not claimed a team in this room.
    NoTeam,
    /// The room is not in the `armed` phase.
    NotArmed,
    /// `remainingMs` had already reached zero.
    TimeUp,
    /// The sender's team is locked out for this round.
    TeamLockedOut,
    /// FairPlay: the sender's team lost window focus.
    FocusLocked,
    /// The sender has been removed from the room.
    Kicked,
}

// ---------------------------------------------------------------------------
// Public room view
// ---------------------------------------------------------------------------

/// One entry of the public `teams` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamView {
    pub id: TeamId,
    pub name: String,
    pub score: i32,
}

/// One entry of the public `takenTeams` list: which player owns which team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakenEntry {
    pub team_id: TeamId,
    pub player_id: PlayerId,
}

/// The most recent successful buzz in the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastBuzz {
    pub by: PlayerId,
    pub team_id: TeamId,
}

/// The full public snapshot of a room, broadcast as `roomState` after every
/// mutating transition. `hostKey` never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_code: RoomCode,
    pub members_count: u32,
    pub tables_chosen_count: u32,
    pub phase: Phase,
    pub round_number: u32,
    pub duration_ms: u64,
    pub remaining_ms: u64,
    pub timer_running: bool,
    pub time_up_at: Option<u64>,
    pub locked_by_player_id: Option<PlayerId>,
    pub locked_by_team_id: Option<TeamId>,
    pub last_buzz: Option<LastBuzz>,
    pub locked_out_teams: Vec<TeamId>,
    pub teams: Vec<TeamView>,
    pub taken_teams: Vec<TakenEntry>,
    pub team_name_locked: Vec<TeamId>,
    pub first_buzz_team_id: Option<TeamId>,
    pub game_over: bool,
    pub winner_team_id: Option<TeamId>,
    pub winner_text: Option<String>,
    pub fair_play_enabled: bool,
    pub focus_locked_teams: Vec<TeamId>,
    pub false_start_teams: Vec<TeamId>,
}

// ---------------------------------------------------------------------------
// Client -> Server events
// ---------------------------------------------------------------------------

/// Every inbound command a client may send, tagged by its `event` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom {
        room_code: String,
        host_key: Option<String>,
        player_id: Option<PlayerId>,
    },
    RejoinRoom {
        room_code: String,
        player_id: PlayerId,
    },
    SetTeam {
        team_id: TeamId,
    },
    SetTeamName {
        team_id: TeamId,
        name: String,
    },
    PlayerFocus {
        focused: bool,
    },
    Buzz,
    FalseStartAttempt,
    HostSetTeamCount {
        count: u32,
    },
    HostSetDuration {
        seconds: f64,
    },
    HostNextRound,
    HostBeepStart,
    HostPauseTimer,
    HostCorrect,
    HostIncorrect,
    HostAdjustScore {
        team_id: TeamId,
        delta: i32,
    },
    HostSetFairPlay {
        enabled: bool,
    },
    HostUnblockFocus {
        team_id: TeamId,
    },
    HostRemoveTeam {
        team_id: TeamId,
    },
    HostEndRound,
}

// ---------------------------------------------------------------------------
// Server -> Client events
// ---------------------------------------------------------------------------

/// Every outbound event the server may emit, tagged by its `event` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    JoinedRoom {
        room_code: RoomCode,
        is_host: bool,
    },
    TeamSet {
        team_id: TeamId,
        locked: bool,
    },
    RoomState {
        #[serde(flatten)]
        view: RoomView,
    },
    Beep,
    Buzzed {
        team_id: TeamId,
        room_code: RoomCode,
    },
    BuzzRejected {
        reason: BuzzRejectReason,
    },
    TimeUp,
    CorrectFx {
        team_id: TeamId,
    },
    Kicked {
        room_code: RoomCode,
        reason: String,
    },
    ErrorMsg {
        message: String,
    },
}
