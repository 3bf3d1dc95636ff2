//! Room lifecycle management for ADABRA.
//!
//! Each room runs as an isolated Tokio task (actor model) holding its own
//! [`Room`] state; the round state machine itself lives in `logic` as
//! plain functions over `&mut Room`, kept separate from the actor so the
//! rules can be unit-tested without spinning up a task.

mod actor;
mod config;
mod error;
mod logic;
mod registry;
mod room;

pub use actor::{ConnId, PlayerSender, RoomHandle, RoomInfo};
pub use config::{
    DEFAULT_DURATION_MS, DEFAULT_TEAM_COUNT, DURATION_MAX_MS, DURATION_MIN_MS, EMPTY_TIMEOUT,
    HOST_KEY_LEN, IDLE_TIMEOUT, REAPER_INTERVAL, ROOM_CODE_ALPHABET, ROOM_CODE_LEN,
    SCORE_DELTA_MAX, TEAM_MAX, TEAM_MIN, TEAM_NAME_MAX, TEAM_NAME_MIN, TICK_INTERVAL_MS,
};
pub use error::{RegistryError, RoomError};
pub use logic::{Effects, Recipient};
pub use registry::{spawn_reaper, RoomRegistry};
pub use room::Room;
