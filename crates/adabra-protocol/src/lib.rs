//! Wire protocol for ADABRA.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomView`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw WebSocket frames) and
//! the room actor. It doesn't know about connections or rooms — it only
//! knows how to serialize and deserialize events and how to shape the
//! public room snapshot.
//!
//! ```text
//! Transport (WS frame) → Protocol (ClientEvent/ServerEvent) → Room actor
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BuzzRejectReason, ClientEvent, LastBuzz, Phase, PlayerId, RoomCode, RoomView, ServerEvent,
    TakenEntry, TeamId, TeamView,
};
