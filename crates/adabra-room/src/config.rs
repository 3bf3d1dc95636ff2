//! Tunable limits and timing constants for the round state machine,
//! the room registry, and the reaper.

use std::time::Duration;

/// Minimum allowed `durationMs` for a round — `> 0` per `hostSetDuration`'s
/// `seconds ∈ (0, 600]` guard, expressed as the smallest representable
/// positive millisecond value the host UI can send (1 second).
pub const DURATION_MIN_MS: u64 = 1_000;
/// Maximum allowed `durationMs` (600 seconds).
pub const DURATION_MAX_MS: u64 = 600_000;

/// Minimum number of teams a room may have.
pub const TEAM_MIN: u32 = 2;
/// Maximum number of teams a room may have.
pub const TEAM_MAX: u32 = 6;

/// Minimum team-name length after whitespace collapse.
pub const TEAM_NAME_MIN: usize = 2;
/// Maximum team-name length after whitespace collapse.
pub const TEAM_NAME_MAX: usize = 16;

/// Largest magnitude `hostAdjustScore` delta accepted in one call.
pub const SCORE_DELTA_MAX: i32 = 100;

/// Default round duration for a freshly created room (15 seconds).
pub const DEFAULT_DURATION_MS: u64 = 15_000;
/// Number of teams a freshly created room starts with.
pub const DEFAULT_TEAM_COUNT: u32 = 2;

/// Cadence of the global round-timer sweep (§4.3).
pub const TICK_INTERVAL_MS: u64 = 200;

/// A room with no activity for this long is reaped regardless of occupancy.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// A room that has been empty (no connected members) for this long is
/// reaped even if it isn't otherwise idle.
pub const EMPTY_TIMEOUT: Duration = Duration::from_secs(2 * 60);
/// How often the registry reaper sweeps for rooms to delete.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 4;
/// Unambiguous alphabet for room codes: no `0`/`O`/`1`/`I`.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
/// Length of the host secret handed back from room creation.
pub const HOST_KEY_LEN: usize = 24;
