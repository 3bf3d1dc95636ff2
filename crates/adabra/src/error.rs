//! Unified error type for the ADABRA binary crate.

use adabra_protocol::ProtocolError;
use adabra_room::RoomError;
use adabra_session::SessionError;

/// Top-level error wrapping every sub-crate's error type.
///
/// The `#[from]` attribute on each variant auto-generates a `From` impl,
/// so the `?` operator converts sub-crate errors automatically wherever
/// this type appears.
#[derive(Debug, thiserror::Error)]
pub enum AdabraError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("registry error: {0}")]
    Registry(#[from] adabra_room::RegistryError),
}
