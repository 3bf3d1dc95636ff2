//! The round state machine: concrete transition functions over [`Room`].
//!
//! ADABRA is one concrete game, so its rules are free functions operating
//! directly on `Room` rather than methods of a pluggable trait. Each
//! function here corresponds to one row (or a small cluster of rows) of
//! the transition table: it validates authority/ownership, mutates the
//! room, and returns the outbound events the caller (the room actor)
//! must fan out.

use adabra_protocol::{
    BuzzRejectReason, LastBuzz, Phase, PlayerId, RoomCode, ServerEvent, TeamId,
};

use crate::config::{
    DURATION_MAX_MS, DURATION_MIN_MS, SCORE_DELTA_MAX, TEAM_MAX, TEAM_MIN, TEAM_NAME_MAX,
    TEAM_NAME_MIN,
};
use crate::error::RoomError;
use crate::room::{Room, TeamData};

/// Who an outbound event is destined for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection subscribed to the room.
    All,
    /// Only the connection that sent the triggering command.
    Sender,
    /// A specific player (used for `kicked`, and `teamSet` on rejoin).
    Player(PlayerId),
}

pub type Effects = Vec<(Recipient, ServerEvent)>;

fn state_broadcast(room: &Room) -> (Recipient, ServerEvent) {
    (
        Recipient::All,
        ServerEvent::RoomState { view: room.to_view() },
    )
}

fn require_not_game_over(room: &Room) -> Result<(), RoomError> {
    if room.game_over {
        Err(RoomError::GameOver)
    } else {
        Ok(())
    }
}

/// Clears everything that's scoped to a single round: lockouts, false
/// starts, focus locks, the current lock-holder, and the last-buzz record.
fn clear_round_state(room: &mut Room) {
    room.locked_out_teams.clear();
    room.false_start_teams.clear();
    room.focus_locked_teams.clear();
    room.locked_by_player_id = None;
    room.locked_by_team_id = None;
    room.last_buzz = None;
    room.first_buzz_team_id = None;
}

// ---------------------------------------------------------------------------
// Joining
// ---------------------------------------------------------------------------

/// `joinRoom` / `rejoinRoom`: identifies the connection's role and, on a
/// known `playerId` that already owns a team, restores that ownership to
/// the client.
pub fn join_room(
    room: &mut Room,
    player_id: &PlayerId,
    host_key: Option<&str>,
    now_ms: u64,
) -> Result<Effects, RoomError> {
    if room.kicked_players.contains(player_id) {
        return Ok(vec![(
            Recipient::Sender,
            ServerEvent::Kicked {
                room_code: room.room_code.clone(),
                reason: "REMOVED_BY_HOST".into(),
            },
        )]);
    }

    room.touch(now_ms);
    let is_host = host_key.is_some_and(|k| k == room.host_key);

    let mut effects = vec![(
        Recipient::Sender,
        ServerEvent::JoinedRoom {
            room_code: room.room_code.clone(),
            is_host,
        },
    )];

    if let Some(team_id) = room.player_teams.get(player_id).cloned() {
        effects.push((
            Recipient::Sender,
            ServerEvent::TeamSet {
                team_id,
                locked: true,
            },
        ));
    }

    effects.push(state_broadcast(room));
    Ok(effects)
}

// ---------------------------------------------------------------------------
// Player commands
// ---------------------------------------------------------------------------

pub fn set_team(room: &mut Room, player_id: &PlayerId, team_id: &TeamId, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if !room.teams.contains_key(team_id) {
        return Err(RoomError::UnknownTeam(team_id.clone()));
    }

    // Idempotent: re-sending the same team is a no-op success, not an error.
    if room.player_teams.get(player_id) == Some(team_id) {
        return Ok(vec![(
            Recipient::Sender,
            ServerEvent::TeamSet { team_id: team_id.clone(), locked: true },
        )]);
    }

    if room.player_teams.contains_key(player_id) {
        // Player already owns a different team; ownership is for the
        // room's lifetime and cannot be reassigned.
        return Err(RoomError::TeamAlreadyTaken(
            room.player_teams[player_id].clone(),
        ));
    }

    if room.team_taken.contains_key(team_id) {
        return Err(RoomError::TeamAlreadyTaken(team_id.clone()));
    }

    room.touch(now_ms);
    room.team_taken.insert(team_id.clone(), player_id.clone());
    room.player_teams.insert(player_id.clone(), team_id.clone());

    Ok(vec![
        (
            Recipient::Sender,
            ServerEvent::TeamSet { team_id: team_id.clone(), locked: true },
        ),
        state_broadcast(room),
    ])
}

pub fn set_team_name(
    room: &mut Room,
    player_id: &PlayerId,
    team_id: &TeamId,
    name: &str,
    now_ms: u64,
) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if room.player_teams.get(player_id) != Some(team_id) {
        return Err(RoomError::NoTeamOwned);
    }
    if room.team_name_locked.contains(team_id) {
        return Err(RoomError::TeamNameAlreadyLocked);
    }

    let cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() < TEAM_NAME_MIN || cleaned.chars().count() > TEAM_NAME_MAX {
        return Err(RoomError::TeamNameLength);
    }

    room.touch(now_ms);
    if let Some(team) = room.teams.get_mut(team_id) {
        team.name = cleaned;
    }
    room.team_name_locked.insert(team_id.clone());

    Ok(vec![state_broadcast(room)])
}

/// FairPlay: a player's client reports focus loss while the round is live.
pub fn player_focus(
    room: &mut Room,
    player_id: &PlayerId,
    focused: bool,
    now_ms: u64,
) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    let Some(team_id) = room.player_teams.get(player_id).cloned() else {
        return Ok(vec![]);
    };

    if focused || !room.fair_play_enabled {
        return Ok(vec![]);
    }
    if !matches!(room.phase, Phase::Armed | Phase::Locked) {
        return Ok(vec![]);
    }

    room.touch(now_ms);
    room.focus_locked_teams.insert(team_id);
    Ok(vec![state_broadcast(room)])
}

/// `buzz` and `falseStartAttempt` are dispatched through this single
/// function: a lobby-phase buzz and an explicit false-start attempt are
/// treated identically (see DESIGN.md).
pub fn buzz(room: &mut Room, player_id: &PlayerId, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if room.kicked_players.contains(player_id) {
        return Ok(vec![(
            Recipient::Sender,
            ServerEvent::BuzzRejected { reason: BuzzRejectReason::Kicked },
        )]);
    }
    let Some(team_id) = room.player_teams.get(player_id).cloned() else {
        return Ok(vec![(
            Recipient::Sender,
            ServerEvent::BuzzRejected { reason: BuzzRejectReason::NoTeam },
        )]);
    };

    match room.phase {
        Phase::Lobby => {
            room.touch(now_ms);
            room.locked_out_teams.insert(team_id.clone());
            room.false_start_teams.insert(team_id);
            Ok(vec![state_broadcast(room)])
        }
        Phase::Locked => Ok(vec![(
            Recipient::Sender,
            ServerEvent::BuzzRejected { reason: BuzzRejectReason::NotArmed },
        )]),
        Phase::Armed => {
            if room.remaining_ms == 0 {
                return Ok(vec![(
                    Recipient::Sender,
                    ServerEvent::BuzzRejected { reason: BuzzRejectReason::TimeUp },
                )]);
            }
            if room.locked_out_teams.contains(&team_id) {
                return Ok(vec![(
                    Recipient::Sender,
                    ServerEvent::BuzzRejected { reason: BuzzRejectReason::TeamLockedOut },
                )]);
            }
            if room.fair_play_enabled && room.focus_locked_teams.contains(&team_id) {
                return Ok(vec![(
                    Recipient::Sender,
                    ServerEvent::BuzzRejected { reason: BuzzRejectReason::FocusLocked },
                )]);
            }

            room.touch(now_ms);
            room.phase = Phase::Locked;
            room.timer_running = false;
            room.locked_by_player_id = Some(player_id.clone());
            room.locked_by_team_id = Some(team_id.clone());
            room.last_buzz = Some(LastBuzz { by: player_id.clone(), team_id: team_id.clone() });
            if room.first_buzz_team_id.is_none() {
                room.first_buzz_team_id = Some(team_id.clone());
            }

            Ok(vec![
                (
                    Recipient::All,
                    ServerEvent::Buzzed { team_id, room_code: room.room_code.clone() },
                ),
                state_broadcast(room),
            ])
        }
    }
}

// ---------------------------------------------------------------------------
// Host commands
// ---------------------------------------------------------------------------

pub fn host_set_team_count(room: &mut Room, desired: u32, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if !(TEAM_MIN..=TEAM_MAX).contains(&desired) {
        return Err(RoomError::TeamCountOutOfRange);
    }
    let current = room.teams.len() as u32;
    if desired < current {
        return Err(RoomError::TeamCountDecreased);
    }
    if desired == current {
        return Ok(vec![]);
    }

    room.touch(now_ms);
    for ordinal in (current + 1)..=desired {
        room.teams
            .insert(TeamId::from_ordinal(ordinal), TeamData::default_named(ordinal));
    }
    Ok(vec![state_broadcast(room)])
}

/// §4.4 states the accepted range as `s ∈ (0,600]`; the additional
/// `DURATION_MIN_MS` floor below rejects the sliver `0<s<1` that would
/// otherwise round to a 0ms round timer, which `Room` (invariant 3) never
/// accepts as a valid duration.
pub fn host_set_duration(room: &mut Room, seconds: f64, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if !(seconds > 0.0 && seconds <= 600.0) {
        return Err(RoomError::DurationOutOfRange);
    }
    let ms = (seconds * 1000.0).round() as u64;
    if ms < DURATION_MIN_MS || ms > DURATION_MAX_MS {
        return Err(RoomError::DurationOutOfRange);
    }

    room.touch(now_ms);
    room.duration_ms = ms;
    if !room.timer_running {
        room.remaining_ms = ms;
    }
    Ok(vec![state_broadcast(room)])
}

pub fn host_next_round(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    room.touch(now_ms);
    room.round_number += 1;
    room.phase = Phase::Lobby;
    room.timer_running = false;
    room.remaining_ms = room.duration_ms;
    room.time_up_at = None;
    clear_round_state(room);
    Ok(vec![state_broadcast(room)])
}

pub fn host_beep_start(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    room.touch(now_ms);
    clear_round_state(room);
    room.remaining_ms = room.duration_ms;
    room.timer_running = true;
    room.timer_last_tick_at = Some(now_ms);
    room.time_up_at = None;
    room.phase = Phase::Armed;
    Ok(vec![(Recipient::All, ServerEvent::Beep), state_broadcast(room)])
}

/// `hostPauseTimer`: a "true pause" (see DESIGN.md) — resets `remainingMs`
/// to `durationMs` and returns to `lobby`, rather than merely freezing
/// the current value.
pub fn host_pause_timer(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    room.touch(now_ms);
    room.phase = Phase::Lobby;
    room.timer_running = false;
    room.timer_last_tick_at = None;
    room.remaining_ms = room.duration_ms;
    clear_round_state(room);
    Ok(vec![state_broadcast(room)])
}

pub fn host_correct(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    let Some(team_id) = room.locked_by_team_id.clone() else {
        return Ok(vec![]);
    };

    room.touch(now_ms);
    if let Some(team) = room.teams.get_mut(&team_id) {
        team.score += 1;
    }
    room.round_number += 1;
    room.phase = Phase::Lobby;
    room.timer_running = false;
    room.remaining_ms = room.duration_ms;
    room.time_up_at = None;
    clear_round_state(room);

    Ok(vec![
        (Recipient::All, ServerEvent::CorrectFx { team_id }),
        state_broadcast(room),
    ])
}

pub fn host_incorrect(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    let Some(team_id) = room.locked_by_team_id.clone() else {
        return Ok(vec![]);
    };

    room.touch(now_ms);
    room.locked_out_teams.insert(team_id);
    room.locked_by_player_id = None;
    room.locked_by_team_id = None;
    room.phase = Phase::Armed;
    if room.remaining_ms > 0 {
        room.timer_running = true;
        room.timer_last_tick_at = Some(now_ms);
    }

    Ok(vec![state_broadcast(room)])
}

pub fn host_adjust_score(room: &mut Room, team_id: &TeamId, delta: i32, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if delta.abs() > SCORE_DELTA_MAX {
        return Err(RoomError::ScoreDeltaOutOfRange);
    }
    let Some(team) = room.teams.get_mut(team_id) else {
        return Err(RoomError::UnknownTeam(team_id.clone()));
    };

    room.touch(now_ms);
    team.score += delta;
    Ok(vec![state_broadcast(room)])
}

pub fn host_set_fair_play(room: &mut Room, enabled: bool, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    room.touch(now_ms);
    room.fair_play_enabled = enabled;
    Ok(vec![state_broadcast(room)])
}

pub fn host_unblock_focus(room: &mut Room, team_id: &TeamId, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if !room.teams.contains_key(team_id) {
        return Err(RoomError::UnknownTeam(team_id.clone()));
    }
    room.touch(now_ms);
    room.focus_locked_teams.remove(team_id);
    Ok(vec![state_broadcast(room)])
}

/// `hostRemoveTeam`: frees the team, kicks its owning player (if any), and
/// if that team was answering, unlocks back to `armed` and resumes the
/// timer.
pub fn host_remove_team(room: &mut Room, team_id: &TeamId, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    if !room.teams.contains_key(team_id) {
        return Err(RoomError::UnknownTeam(team_id.clone()));
    }

    room.touch(now_ms);
    let owner = room.team_taken.remove(team_id);
    let mut effects = Vec::new();

    if let Some(player_id) = owner.clone() {
        room.player_teams.remove(&player_id);
        room.kicked_players.insert(player_id.clone());
        effects.push((
            Recipient::Player(player_id),
            ServerEvent::Kicked {
                room_code: room.room_code.clone(),
                reason: "REMOVED_BY_HOST".into(),
            },
        ));
    }

    room.team_name_locked.remove(team_id);
    room.locked_out_teams.remove(team_id);
    room.false_start_teams.remove(team_id);
    room.focus_locked_teams.remove(team_id);
    if let Some(team) = room.teams.get_mut(team_id) {
        let ordinal: u32 = team_id.0.parse().unwrap_or(0);
        *team = TeamData::default_named(ordinal);
    }

    if room.locked_by_team_id.as_ref() == Some(team_id) {
        room.locked_by_player_id = None;
        room.locked_by_team_id = None;
        room.phase = Phase::Armed;
        if room.remaining_ms > 0 {
            room.timer_running = true;
            room.timer_last_tick_at = Some(now_ms);
        }
    }

    effects.push(state_broadcast(room));
    Ok(effects)
}

pub fn host_end_round(room: &mut Room, now_ms: u64) -> Result<Effects, RoomError> {
    require_not_game_over(room)?;
    room.touch(now_ms);
    room.phase = Phase::Lobby;
    room.timer_running = false;
    clear_round_state(room);

    let max_score = room.teams.values().map(|t| t.score).max().unwrap_or(0);
    let winners: Vec<TeamId> = room
        .teams
        .iter()
        .filter(|(_, t)| t.score == max_score)
        .map(|(id, _)| id.clone())
        .collect();

    room.game_over = true;
    if winners.len() == 1 {
        room.winner_team_id = Some(winners[0].clone());
    } else {
        let names: Vec<String> = winners
            .iter()
            .filter_map(|id| room.teams.get(id).map(|t| t.name.clone()))
            .collect();
        room.winner_text = Some(format!("Tie between {}", names.join(", ")));
    }

    Ok(vec![state_broadcast(room)])
}

// ---------------------------------------------------------------------------
// Timer tick
// ---------------------------------------------------------------------------

/// Called by the global sweep for every room with `timerRunning = true`.
/// Advances `remainingMs` by the wall-clock delta since the last tick and,
/// on expiry, runs the time-up transition back to `lobby`.
pub fn tick(room: &mut Room, now_ms: u64) -> Effects {
    if !room.timer_running {
        return vec![];
    }

    let last = room.timer_last_tick_at.unwrap_or(now_ms);
    let delta = now_ms.saturating_sub(last);
    room.timer_last_tick_at = Some(now_ms);
    room.remaining_ms = room.remaining_ms.saturating_sub(delta);

    if room.remaining_ms > 0 {
        return vec![];
    }

    room.timer_running = false;
    room.timer_last_tick_at = None;
    room.time_up_at = Some(now_ms);
    room.phase = Phase::Lobby;
    clear_round_state(room);

    vec![(Recipient::All, ServerEvent::TimeUp), state_broadcast(room)]
}
