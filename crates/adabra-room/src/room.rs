//! The Room data model: every field from the data model table, plus the
//! snapshot builder that turns it into the wire-level [`RoomView`].

use std::collections::{BTreeMap, HashMap, HashSet};

use adabra_protocol::{
    LastBuzz, Phase, PlayerId, RoomCode, RoomView, TakenEntry, TeamId, TeamView,
};

use crate::config::{DEFAULT_DURATION_MS, DEFAULT_TEAM_COUNT};

#[derive(Debug, Clone)]
pub(crate) struct TeamData {
    pub name: String,
    pub score: i32,
}

impl TeamData {
    pub(crate) fn default_named(ordinal: u32) -> Self {
        Self {
            name: format!("Team {ordinal}"),
            score: 0,
        }
    }
}

/// One game room. Lives inside a single actor task (see `actor.rs`); every
/// field here is touched only while that task holds `&mut self`, which is
/// the concurrency model's substitute for a per-room mutex (§5).
#[derive(Debug, Clone)]
pub struct Room {
    pub room_code: RoomCode,
    pub host_key: String,
    pub created_at: u64,
    pub last_activity_at: u64,

    pub phase: Phase,
    pub round_number: u32,

    pub duration_ms: u64,
    pub remaining_ms: u64,
    pub timer_running: bool,
    pub timer_last_tick_at: Option<u64>,
    pub time_up_at: Option<u64>,

    pub(crate) teams: BTreeMap<TeamId, TeamData>,
    pub team_taken: HashMap<TeamId, PlayerId>,
    pub team_name_locked: HashSet<TeamId>,
    pub player_teams: HashMap<PlayerId, TeamId>,

    pub locked_out_teams: HashSet<TeamId>,
    pub false_start_teams: HashSet<TeamId>,
    pub focus_locked_teams: HashSet<TeamId>,
    pub kicked_players: HashSet<PlayerId>,

    pub locked_by_player_id: Option<PlayerId>,
    pub locked_by_team_id: Option<TeamId>,
    pub last_buzz: Option<LastBuzz>,
    pub first_buzz_team_id: Option<TeamId>,

    pub fair_play_enabled: bool,

    pub game_over: bool,
    pub winner_team_id: Option<TeamId>,
    pub winner_text: Option<String>,

    /// Best-effort count of connected sessions; not safety-critical.
    pub members_count: u32,
}

impl Room {
    /// Creates a freshly seeded room: two default teams, default duration,
    /// `lobby` phase, timer stopped.
    pub fn new(room_code: RoomCode, host_key: String, now_ms: u64) -> Self {
        let mut teams = BTreeMap::new();
        for ordinal in 1..=DEFAULT_TEAM_COUNT {
            teams.insert(TeamId::from_ordinal(ordinal), TeamData::default_named(ordinal));
        }

        Self {
            room_code,
            host_key,
            created_at: now_ms,
            last_activity_at: now_ms,
            phase: Phase::Lobby,
            round_number: 1,
            duration_ms: DEFAULT_DURATION_MS,
            remaining_ms: DEFAULT_DURATION_MS,
            timer_running: false,
            timer_last_tick_at: None,
            time_up_at: None,
            teams,
            team_taken: HashMap::new(),
            team_name_locked: HashSet::new(),
            player_teams: HashMap::new(),
            locked_out_teams: HashSet::new(),
            false_start_teams: HashSet::new(),
            focus_locked_teams: HashSet::new(),
            kicked_players: HashSet::new(),
            locked_by_player_id: None,
            locked_by_team_id: None,
            last_buzz: None,
            first_buzz_team_id: None,
            fair_play_enabled: true,
            game_over: false,
            winner_team_id: None,
            winner_text: None,
            members_count: 0,
        }
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_activity_at = now_ms;
    }

    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_activity_at)
    }

    /// Builds the public snapshot sent as `roomState`. `hostKey` never
    /// appears here.
    pub fn to_view(&self) -> RoomView {
        let teams = self
            .teams
            .iter()
            .map(|(id, data)| TeamView {
                id: id.clone(),
                name: data.name.clone(),
                score: data.score,
            })
            .collect();

        let mut taken_teams: Vec<TakenEntry> = self
            .team_taken
            .iter()
            .map(|(team_id, player_id)| TakenEntry {
                team_id: team_id.clone(),
                player_id: player_id.clone(),
            })
            .collect();
        taken_teams.sort_by(|a, b| a.team_id.cmp(&b.team_id));

        let mut locked_out_teams: Vec<TeamId> = self.locked_out_teams.iter().cloned().collect();
        locked_out_teams.sort();
        let mut team_name_locked: Vec<TeamId> = self.team_name_locked.iter().cloned().collect();
        team_name_locked.sort();
        let mut focus_locked_teams: Vec<TeamId> = self.focus_locked_teams.iter().cloned().collect();
        focus_locked_teams.sort();
        let mut false_start_teams: Vec<TeamId> = self.false_start_teams.iter().cloned().collect();
        false_start_teams.sort();

        RoomView {
            room_code: self.room_code.clone(),
            members_count: self.members_count,
            tables_chosen_count: self.team_taken.len() as u32,
            phase: self.phase,
            round_number: self.round_number,
            duration_ms: self.duration_ms,
            remaining_ms: self.remaining_ms,
            timer_running: self.timer_running,
            time_up_at: self.time_up_at,
            locked_by_player_id: self.locked_by_player_id.clone(),
            locked_by_team_id: self.locked_by_team_id.clone(),
            last_buzz: self.last_buzz.clone(),
            locked_out_teams,
            teams,
            taken_teams,
            team_name_locked,
            first_buzz_team_id: self.first_buzz_team_id.clone(),
            game_over: self.game_over,
            winner_team_id: self.winner_team_id.clone(),
            winner_text: self.winner_text.clone(),
            fair_play_enabled: self.fair_play_enabled,
            focus_locked_teams,
            false_start_teams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_room_has_two_default_teams_and_lobby_phase() {
        let room = Room::new(RoomCode("ABCD".into()), "secret".into(), 0);
        assert_eq!(room.teams.len(), 2);
        assert_eq!(room.phase, Phase::Lobby);
        assert_eq!(room.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(room.remaining_ms, DEFAULT_DURATION_MS);
        assert!(!room.timer_running);
    }

    #[test]
    fn view_never_exposes_host_key() {
        let room = Room::new(RoomCode("ABCD".into()), "secret".into(), 0);
        let json = serde_json::to_string(&room.to_view()).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("hostKey"));
    }

    #[test]
    fn view_reflects_team_order() {
        let room = Room::new(RoomCode("ABCD".into()), "secret".into(), 0);
        let view = room.to_view();
        assert_eq!(view.teams[0].id, TeamId("1".into()));
        assert_eq!(view.teams[1].id, TeamId("2".into()));
    }
}
