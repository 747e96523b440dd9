//! Room orchestration for Trivium.
//!
//! Each room runs as an isolated Tokio task (actor model) owning the
//! authoritative quiz state: phase machine, question snapshot, roster,
//! scores, and the single pending phase deadline. Commands, transport
//! disconnects, and timer fires all funnel through the actor's one command
//! loop, which is what makes a deadline expiry and a last-second answer
//! impossible to apply concurrently.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — process-wide code→room table, code generation,
//!   global stats counters
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] / [`RegistryConfig`] — tunables with documented defaults
//! - [`RoomError`] — the orchestrator's error taxonomy

mod code;
mod config;
mod error;
mod registry;
mod room;
mod scoring;

pub use code::ROOM_CODE_LEN;
pub use config::{RegistryConfig, RoomConfig};
pub use error::RoomError;
pub use registry::{GlobalStats, RoomRegistry};
pub use room::{RoomHandle, RoomSnapshot};
pub use scoring::points_awarded;
