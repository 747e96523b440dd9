//! Room and registry configuration.
//!
//! Every duration and point value the quiz flow depends on is a knob
//! here, with defaults chosen for a casual-pace quiz. Tests shrink the
//! phase durations to keep flows fast; nothing reads these from the
//! environment — the embedding server decides.

use std::time::Duration;

/// Per-room tunables. One copy per room, taken at creation time.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long players have to answer each question.
    pub answer_window: Duration,

    /// How long the correct answer + deltas stay on screen.
    pub reveal_duration: Duration,

    /// How long the between-questions leaderboard stays on screen.
    pub scoreboard_duration: Duration,

    /// How long a disconnected player's identity survives for reconnection.
    pub reconnect_grace: Duration,

    /// How long a room may sit with zero connected players (or finished)
    /// before it is evicted.
    pub idle_timeout: Duration,

    /// Cadence of the actor's housekeeping pass (grace expiry, eviction).
    pub sweep_interval: Duration,

    /// Maximum members per room, connected or not.
    pub max_players: usize,

    /// Points for a correct answer regardless of speed.
    pub base_points: u32,

    /// Extra points for an instant correct answer, decaying linearly to
    /// zero at the deadline.
    pub time_bonus_max: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            answer_window: Duration::from_secs(20),
            reveal_duration: Duration::from_secs(5),
            scoreboard_duration: Duration::from_secs(5),
            reconnect_grace: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(1),
            max_players: 64,
            base_points: 100,
            time_bonus_max: 100,
        }
    }
}

/// Process-wide registry tunables.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum concurrent rooms before `create_room` fails with
    /// `CapacityExceeded`.
    pub max_rooms: usize,

    /// Bound of each room actor's command channel. Senders wait when a
    /// room falls this far behind.
    pub command_buffer: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_rooms: 2048,
            command_buffer: 64,
        }
    }
}
