//! Unified error type for the Trivium server.

use trivium_content::ContentError;
use trivium_protocol::ProtocolError;
use trivium_room::RoomError;
use trivium_transport::TransportError;

/// Top-level error wrapping every layer-specific error.
///
/// The `#[from]` attributes generate `From` impls so `?` converts
/// sub-crate errors automatically throughout the server and handler.
#[derive(Debug, thiserror::Error)]
pub enum TriviumError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (capacity, unknown code, bad command).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A content adapter error (unknown or empty collection).
    #[error(transparent)]
    Content(#[from] ContentError),
}
