//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, reachable only through an mpsc
//! channel — the actor model is this crate's substitute for a per-room
//! mutex (§5): every mutation of a `Room` happens on the single task that
//! owns it, so two commands for the same room can never race.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use adabra_protocol::{ClientEvent, PlayerId, RoomCode, ServerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::error::RoomError;
use crate::logic::{self, Recipient};
use crate::room::Room;

/// Channel used to push events to a single connection's write half.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Counter for generating unique connection IDs.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a single socket, independent of the `playerId` it carries.
///
/// A `playerId` is chosen by the client and can be shared by several
/// sockets at once (§4.2: a refresh or a second tab rejoining before the
/// old socket's teardown is processed). Keying live connections by
/// `ConnId` instead of `PlayerId` means each socket's join and leave are
/// bookkept independently — closing one never tears down another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Commands accepted by a running room actor.
pub(crate) enum RoomCommand {
    /// A connection joins (or rejoins) the room.
    Join {
        player_id: PlayerId,
        host_key: Option<String>,
        sender: PlayerSender,
        now_ms: u64,
        reply: oneshot::Sender<Result<ConnId, RoomError>>,
    },
    /// A connection drops. Not an error — players may leave mid-round.
    Leave { conn_id: ConnId },
    /// A validated client command, already authority-checked by the
    /// session layer. Errors are reported to the sender as `errorMsg`
    /// rather than surfaced through the channel.
    Dispatch {
        conn_id: ConnId,
        event: ClientEvent,
        now_ms: u64,
    },
    /// Driven by the global round-timer sweep (§4.3).
    Tick { now_ms: u64 },
    /// Metadata snapshot for the registry's reaper and health endpoint.
    GetInfo {
        now_ms: u64,
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Room metadata visible to the registry without routing through the
/// full command/reply cycle for every reaper sweep.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub members_count: u32,
    pub game_over: bool,
    pub idle_ms: u64,
}

/// Cheap, cloneable handle to a running room actor.
#[derive(Clone)]
pub struct RoomHandle {
    room_code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Registers a new connection and returns the [`ConnId`] the caller
    /// must hand back to [`RoomHandle::dispatch`] and
    /// [`RoomHandle::leave`] for the lifetime of this socket.
    pub async fn join(
        &self,
        player_id: PlayerId,
        host_key: Option<String>,
        sender: PlayerSender,
        now_ms: u64,
    ) -> Result<ConnId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                host_key,
                sender,
                now_ms,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    pub async fn leave(&self, conn_id: ConnId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { conn_id })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    pub async fn dispatch(
        &self,
        conn_id: ConnId,
        event: ClientEvent,
        now_ms: u64,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Dispatch { conn_id, event, now_ms })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    pub async fn tick(&self, now_ms: u64) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Tick { now_ms })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    pub async fn info(&self, now_ms: u64) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { now_ms, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// A single live socket: which `playerId` it was established under, and
/// where to push outbound events.
struct Connection {
    player_id: PlayerId,
    sender: PlayerSender,
}

struct RoomActor {
    room: Room,
    connections: HashMap<ConnId, Connection>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_code = self.room.room_code.clone();
        tracing::info!(%room_code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { player_id, host_key, sender, now_ms, reply } => {
                    let result = self.handle_join(player_id, host_key, sender, now_ms);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { conn_id } => self.handle_leave(conn_id),
                RoomCommand::Dispatch { conn_id, event, now_ms } => {
                    self.handle_dispatch(conn_id, event, now_ms);
                }
                RoomCommand::Tick { now_ms } => {
                    let effects = logic::tick(&mut self.room, now_ms);
                    self.fan_out(None, effects);
                }
                RoomCommand::GetInfo { now_ms, reply } => {
                    let _ = reply.send(self.info(now_ms));
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_code, "room actor shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        host_key: Option<String>,
        sender: PlayerSender,
        now_ms: u64,
    ) -> Result<ConnId, RoomError> {
        // A kicked player never actually joins: no connection is
        // registered and `membersCount` doesn't move. The single `kicked`
        // reply tells the connection handler to detach without standing
        // up a session.
        if self.room.kicked_players.contains(&player_id) {
            let _ = sender.send(ServerEvent::Kicked {
                room_code: self.room.room_code.clone(),
                reason: "REMOVED_BY_HOST".into(),
            });
            return Ok(ConnId::next());
        }

        let conn_id = ConnId::next();
        self.connections.insert(conn_id, Connection { player_id: player_id.clone(), sender });
        self.room.members_count += 1;

        let effects = match logic::join_room(&mut self.room, &player_id, host_key.as_deref(), now_ms) {
            Ok(effects) => effects,
            Err(err) => {
                self.send_to_conn(conn_id, ServerEvent::ErrorMsg { message: err.to_string() });
                return Err(err);
            }
        };
        self.fan_out(Some(conn_id), effects);
        Ok(conn_id)
    }

    fn handle_leave(&mut self, conn_id: ConnId) {
        if let Some(conn) = self.connections.remove(&conn_id) {
            self.room.members_count = self.room.members_count.saturating_sub(1);
            tracing::info!(
                room_code = %self.room.room_code,
                %conn_id,
                player_id = %conn.player_id,
                "connection left"
            );
        }
    }

    fn handle_dispatch(&mut self, conn_id: ConnId, event: ClientEvent, now_ms: u64) {
        let Some(player_id) = self.connections.get(&conn_id).map(|c| c.player_id.clone()) else {
            return;
        };
        let result = self.apply(&player_id, event, now_ms);
        match result {
            Ok(effects) => self.fan_out(Some(conn_id), effects),
            Err(err) => {
                self.send_to_conn(conn_id, ServerEvent::ErrorMsg { message: err.to_string() });
            }
        }
    }

    fn apply(
        &mut self,
        player_id: &PlayerId,
        event: ClientEvent,
        now_ms: u64,
    ) -> Result<logic::Effects, RoomError> {
        use ClientEvent::*;
        let room = &mut self.room;
        match event {
            JoinRoom { .. } | RejoinRoom { .. } => Ok(vec![]),
            SetTeam { team_id } => logic::set_team(room, player_id, &team_id, now_ms),
            SetTeamName { team_id, name } => logic::set_team_name(room, player_id, &team_id, &name, now_ms),
            PlayerFocus { focused } => logic::player_focus(room, player_id, focused, now_ms),
            Buzz | FalseStartAttempt => logic::buzz(room, player_id, now_ms),
            HostSetTeamCount { count } => logic::host_set_team_count(room, count, now_ms),
            HostSetDuration { seconds } => logic::host_set_duration(room, seconds, now_ms),
            HostNextRound => logic::host_next_round(room, now_ms),
            HostBeepStart => logic::host_beep_start(room, now_ms),
            HostPauseTimer => logic::host_pause_timer(room, now_ms),
            HostCorrect => logic::host_correct(room, now_ms),
            HostIncorrect => logic::host_incorrect(room, now_ms),
            HostAdjustScore { team_id, delta } => logic::host_adjust_score(room, &team_id, delta, now_ms),
            HostSetFairPlay { enabled } => logic::host_set_fair_play(room, enabled, now_ms),
            HostUnblockFocus { team_id } => logic::host_unblock_focus(room, &team_id, now_ms),
            HostRemoveTeam { team_id } => logic::host_remove_team(room, &team_id, now_ms),
            HostEndRound => logic::host_end_round(room, now_ms),
        }
    }

    /// Routes each `(Recipient, ServerEvent)` pair to the matching
    /// connection(s). `sender` is whoever triggered this batch of
    /// effects (`None` for the timer sweep, which has no triggering
    /// connection); `Recipient::Sender` resolves against it and is never
    /// produced when `sender` is `None`. `Recipient::Player` and
    /// `Recipient::All` fan out to every connection sharing that
    /// `playerId` (or all connections in the room), not just one.
    fn fan_out(&self, sender: Option<ConnId>, effects: logic::Effects) {
        for (recipient, event) in effects {
            match recipient {
                Recipient::All => {
                    for conn in self.connections.values() {
                        let _ = conn.sender.send(event.clone());
                    }
                }
                Recipient::Sender => {
                    if let Some(conn_id) = sender {
                        self.send_to_conn(conn_id, event);
                    }
                }
                Recipient::Player(pid) => self.send_to_player(&pid, event),
            }
        }
    }

    fn send_to_conn(&self, conn_id: ConnId, event: ServerEvent) {
        if let Some(conn) = self.connections.get(&conn_id) {
            let _ = conn.sender.send(event);
        }
    }

    fn send_to_player(&self, player_id: &PlayerId, event: ServerEvent) {
        for conn in self.connections.values() {
            if conn.player_id == *player_id {
                let _ = conn.sender.send(event.clone());
            }
        }
    }

    fn info(&self, now_ms: u64) -> RoomInfo {
        RoomInfo {
            room_code: self.room.room_code.clone(),
            members_count: self.room.members_count,
            game_over: self.room.game_over,
            idle_ms: self.room.idle_ms(now_ms),
        }
    }
}

/// Spawns a room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room(room: Room, channel_size: usize) -> RoomHandle {
    let room_code = room.room_code.clone();
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room,
        connections: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_code, sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adabra_protocol::{Phase, TeamId};

    fn spawn_test_room() -> RoomHandle {
        let room = Room::new(RoomCode("ABCD".into()), "secret".into(), 0);
        spawn_room(room, 32)
    }

    #[tokio::test]
    async fn join_then_dispatch_round_trips_through_the_actor() {
        let handle = spawn_test_room();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = PlayerId("p1".into());

        let conn_id = handle.join(player.clone(), None, tx, 0).await.unwrap();
        let joined = rx.recv().await.unwrap();
        assert!(matches!(joined, ServerEvent::JoinedRoom { is_host: false, .. }));
        let _state = rx.recv().await.unwrap();

        handle
            .dispatch(conn_id, ClientEvent::SetTeam { team_id: TeamId("1".into()) }, 10)
            .await
            .unwrap();
        let team_set = rx.recv().await.unwrap();
        assert!(matches!(team_set, ServerEvent::TeamSet { locked: true, .. }));

        let info = handle.info(0).await.unwrap();
        assert_eq!(info.members_count, 1);

        handle.leave(conn_id).await.unwrap();
        let info = handle.info(0).await.unwrap();
        assert_eq!(info.members_count, 0);
    }

    #[tokio::test]
    async fn host_joining_with_correct_key_is_recognized() {
        let handle = spawn_test_room();
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle
            .join(PlayerId("host".into()), Some("secret".into()), tx, 0)
            .await
            .unwrap();
        let joined = rx.recv().await.unwrap();
        assert!(matches!(joined, ServerEvent::JoinedRoom { is_host: true, .. }));
    }

    #[tokio::test]
    async fn tick_broadcasts_time_up_to_every_connection() {
        let handle = spawn_test_room();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let conn1 = handle.join(PlayerId("p1".into()), None, tx1, 0).await.unwrap();
        let _ = rx1.recv().await;
        let _ = rx1.recv().await;
        handle.join(PlayerId("p2".into()), None, tx2, 0).await.unwrap();
        let _ = rx2.recv().await;
        let _ = rx2.recv().await;

        handle
            .dispatch(conn1, ClientEvent::SetTeam { team_id: TeamId("1".into()) }, 0)
            .await
            .unwrap();
        let _ = rx1.recv().await;
        let _ = rx1.recv().await;
        let _ = rx2.recv().await;

        handle.dispatch(conn1, ClientEvent::HostBeepStart, 0).await.unwrap();
        let _ = rx1.recv().await;
        let _ = rx1.recv().await;
        let _ = rx2.recv().await;

        handle.tick(100_000).await.unwrap();
        let ev1 = rx1.recv().await.unwrap();
        let ev2 = rx2.recv().await.unwrap();
        assert!(matches!(ev1, ServerEvent::TimeUp));
        assert!(matches!(ev2, ServerEvent::TimeUp));

        let info = handle.info(100_000).await.unwrap();
        assert!(!info.game_over);
        let _ = Phase::Lobby;
    }

    /// The bug the `ConnId` refactor fixes: a refresh (or second tab)
    /// opens a new socket under the same `playerId` before the old
    /// socket's teardown runs. The old socket's `leave` must remove only
    /// its own connection -- the still-open new socket keeps receiving
    /// broadcasts and `membersCount` reflects one live connection, not
    /// zero.
    #[tokio::test]
    async fn a_stale_connection_leaving_does_not_disconnect_a_refreshed_tab() {
        let handle = spawn_test_room();
        let player = PlayerId("p1".into());

        let (tx_old, mut rx_old) = mpsc::unbounded_channel();
        let old_conn = handle.join(player.clone(), None, tx_old, 0).await.unwrap();
        let _ = rx_old.recv().await;
        let _ = rx_old.recv().await;

        let (tx_new, mut rx_new) = mpsc::unbounded_channel();
        let new_conn = handle.join(player.clone(), None, tx_new, 0).await.unwrap();
        let _ = rx_new.recv().await;
        let _ = rx_new.recv().await;
        assert_ne!(old_conn, new_conn);

        let info = handle.info(0).await.unwrap();
        assert_eq!(info.members_count, 2);

        handle.leave(old_conn).await.unwrap();
        let info = handle.info(0).await.unwrap();
        assert_eq!(info.members_count, 1);

        // The refreshed tab is still live: broadcasts still reach it.
        handle
            .dispatch(new_conn, ClientEvent::SetTeam { team_id: TeamId("1".into()) }, 0)
            .await
            .unwrap();
        let team_set = rx_new.recv().await.unwrap();
        assert!(matches!(team_set, ServerEvent::TeamSet { locked: true, .. }));
    }

    /// A command from a `conn_id` that already left (or never existed)
    /// is a silent no-op, not a panic or a reported error -- the
    /// connection handler has already torn itself down by then.
    #[tokio::test]
    async fn dispatch_from_an_unknown_connection_is_a_silent_no_op() {
        let handle = spawn_test_room();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn_id = handle.join(PlayerId("p1".into()), None, tx, 0).await.unwrap();
        handle.leave(conn_id).await.unwrap();

        handle
            .dispatch(conn_id, ClientEvent::SetTeam { team_id: TeamId("1".into()) }, 0)
            .await
            .unwrap();
        let info = handle.info(0).await.unwrap();
        assert_eq!(info.members_count, 0);
    }
}
