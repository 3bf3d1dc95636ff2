//! # Adabra
//!
//! Real-time, server-authoritative buzzer coordinator for live quiz
//! games. A host runs a round; players join a room by a short code and
//! race to buzz in once the round is armed. The server is the single
//! source of truth for the round phase and timer — clients only render
//! what it broadcasts.
//!
//! ## Layout
//!
//! - [`adabra_protocol`] — wire types and the client/server event enums.
//! - [`adabra_session`] — per-connection session state and command
//!   authority checks.
//! - [`adabra_room`] — the room actor, round state machine, and registry.
//! - [`adabra_timer`] — the fixed-cadence scheduler driving the round
//!   timer sweep.
//!
//! This crate wires those together behind an axum HTTP + WebSocket
//! server.

mod error;
mod handler;
mod server;
mod time;

pub use error::AdabraError;
pub use server::{build_router, spawn_tick_sweep, AppState};
