//! Room registry: creates, looks up, and reaps rooms.
//!
//! One hash map of handles, guarded so the session layer never touches a
//! `Room` directly. Room codes (not numeric IDs) are the lookup key, and
//! a browser tab joins exactly one room by code and stays there for the
//! life of its connection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use adabra_protocol::RoomCode;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::actor::{spawn_room, RoomHandle};
use crate::config::{
    EMPTY_TIMEOUT, HOST_KEY_LEN, IDLE_TIMEOUT, ROOM_CODE_ALPHABET, ROOM_CODE_LEN,
};
use crate::error::RegistryError;
use crate::room::Room;

const DEFAULT_CHANNEL_SIZE: usize = 64;
const CODE_GEN_ATTEMPTS: usize = 64;

/// Handles to every active room, keyed by its public code.
///
/// Cheap to clone: internally an `Arc<Mutex<_>>` over a map of
/// already-cheap-to-clone [`RoomHandle`]s, so the registry itself can be
/// shared across every connection handler without an `Arc` wrapper at the
/// call site.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<RoomCode, RoomHandle>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, unused room code and host key, spawns the room
    /// actor, and registers it. Returns the code, the host key (given to
    /// the creating client out of band, never broadcast), and a handle.
    pub fn create_room(&self, now_ms: u64) -> Result<(RoomCode, String, RoomHandle), RegistryError> {
        let mut rooms = self.rooms.lock().expect("room registry poisoned");

        let mut rng = rand::rng();
        let room_code = (0..CODE_GEN_ATTEMPTS)
            .map(|_| generate_code(&mut rng))
            .find(|code| !rooms.contains_key(code))
            .ok_or(RegistryError::CodeSpaceExhausted)?;

        let host_key: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(HOST_KEY_LEN)
            .map(char::from)
            .collect();

        let room = Room::new(room_code.clone(), host_key.clone(), now_ms);
        let handle = spawn_room(room, DEFAULT_CHANNEL_SIZE);
        rooms.insert(room_code.clone(), handle.clone());

        tracing::info!(%room_code, "room created");
        Ok((room_code, host_key, handle))
    }

    pub fn get(&self, room_code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.lock().expect("room registry poisoned").get(room_code).cloned()
    }

    pub fn remove(&self, room_code: &RoomCode) {
        self.rooms.lock().expect("room registry poisoned").remove(room_code);
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().expect("room registry poisoned").len()
    }

    /// Cloned handles to every active room. Used by the global round-timer
    /// sweep, which has no other way to reach per-room state.
    pub fn all_handles(&self) -> Vec<RoomHandle> {
        self.rooms.lock().expect("room registry poisoned").values().cloned().collect()
    }

    /// Queries every room's info and shuts down (and unregisters) any
    /// room that has exceeded its idle or empty timeout. Rooms whose
    /// actor has already stopped responding are unregistered outright.
    pub async fn reap_idle(&self, now_ms: u64) {
        let handles: Vec<RoomHandle> = {
            let rooms = self.rooms.lock().expect("room registry poisoned");
            rooms.values().cloned().collect()
        };

        for handle in handles {
            let reap = match handle.info(now_ms).await {
                Ok(info) => {
                    let idle_too_long = info.idle_ms >= IDLE_TIMEOUT.as_millis() as u64;
                    let empty_too_long =
                        info.members_count == 0 && info.idle_ms >= EMPTY_TIMEOUT.as_millis() as u64;
                    idle_too_long || empty_too_long
                }
                Err(_) => true,
            };

            if reap {
                tracing::info!(room_code = %handle.room_code(), "reaping idle room");
                let _ = handle.shutdown().await;
                self.remove(handle.room_code());
            }
        }
    }
}

fn generate_code(rng: &mut impl Rng) -> RoomCode {
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode(code)
}

/// Spawns the background task that periodically calls [`RoomRegistry::reap_idle`].
pub fn spawn_reaper(registry: RoomRegistry) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(crate::config::REAPER_INTERVAL);
        loop {
            interval.tick().await;
            let now_ms = now_ms();
            registry.reap_idle(now_ms).await;
        }
    })
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_use_only_the_unambiguous_alphabet() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.0.len(), ROOM_CODE_LEN);
            assert!(code.0.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn create_room_registers_a_reachable_handle() {
        let registry = RoomRegistry::new();
        let (code, host_key, _handle) = registry.create_room(0).unwrap();
        assert_eq!(host_key.len(), HOST_KEY_LEN);
        assert!(registry.get(&code).is_some());
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn reap_idle_removes_rooms_past_the_idle_timeout() {
        let registry = RoomRegistry::new();
        let (code, _, _handle) = registry.create_room(0).unwrap();

        let far_future = IDLE_TIMEOUT.as_millis() as u64 + 1;
        registry.reap_idle(far_future).await;

        assert!(registry.get(&code).is_none());
        assert_eq!(registry.room_count(), 0);
    }
}
