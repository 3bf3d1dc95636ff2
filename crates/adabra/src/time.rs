//! Monotonic-enough wall-clock milliseconds, shared by every background
//! task and connection handler that needs a `now_ms` to hand to the room
//! actor (the actor itself never reads the system clock).

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}
