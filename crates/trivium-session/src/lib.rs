//! Player session tracking for Trivium rooms.
//!
//! This crate binds durable player identity (the caller-supplied token) to
//! live connections, and keeps that identity alive across brief
//! disconnects:
//!
//! 1. **Attachment** — a connection plus token becomes a [`Player`]
//! 2. **Reconnection** — the same token within the grace period reclaims
//!    the existing Player, score and answers intact
//! 3. **Expiry** — a token that stays away past the grace period is
//!    removed for good
//!
//! # Concurrency note
//!
//! [`Roster`] is NOT thread-safe, on purpose: each roster is owned by
//! exactly one room actor, which is the serialization boundary for all of
//! that room's state. Wrapping the roster in its own lock would only hide
//! where the single-writer discipline actually lives.

mod error;
mod player;
mod roster;

pub use error::RosterError;
pub use player::{Answer, EventSink, Player};
pub use roster::{AttachOutcome, Roster, RosterConfig};
