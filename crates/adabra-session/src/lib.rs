//! Per-connection session state for ADABRA.
//!
//! A [`Session`] records which room a WebSocket connection joined, which
//! player it speaks for, and whether it authenticated as host. The
//! [`authority`] module answers "is this role allowed to send this
//! command" — the piece of command validation that doesn't require
//! reaching into room-internal state (ownership of a specific team is
//! checked by the room actor itself, since that requires the room's
//! `playerTeams` map).
//!
//! # How it fits in the stack
//!
//! ```text
//! Room actor (above)   ← uses Session::role for host-gated transitions
//!     ↕
//! Session layer (this crate)  ← Session + command-authority table
//!     ↕
//! Protocol layer (below)  ← provides PlayerId, RoomCode, ClientEvent
//! ```

mod authority;
mod error;
mod session;

pub use authority::{Authority, authority_of, check_authority};
pub use error::SessionError;
pub use session::{Role, Session};
