//! Wire protocol for Trivium.
//!
//! This crate defines the "language" that quiz clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], identity newtypes) — the
//!   event structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the room
//! orchestrator (game state). It doesn't know about connections or rooms —
//! it only knows how to describe and serialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent/ServerEvent) → Room (quiz state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, CollectionId, ErrorKind, GameOptions, Phase, PlayerDelta,
    PlayerId, PlayerSummary, PlayerToken, RankedEntry, RoomCode, ServerEvent,
};
