//! Scoring: base points plus a linearly decaying speed bonus.
//!
//! A correct answer at the instant the question opens earns
//! `base_points + time_bonus_max`; one at the deadline earns `base_points`;
//! the bonus decays linearly in between. Wrong or missing answers earn
//! zero, which the caller handles — this module only prices correct ones.
//!
//! Awards are computed once per question per player, at reveal entry, from
//! the recorded answer latencies. Nothing here mutates scores.

use std::time::Duration;

use crate::RoomConfig;

/// Points for a correct answer submitted `latency` after the question
/// opened, given an answer window of `window`.
///
/// Latencies at or past the window still earn the base (the answer was
/// accepted while the window was open; clock skew between acceptance and
/// scoring must not turn a correct answer into zero).
pub fn points_awarded(latency: Duration, window: Duration, config: &RoomConfig) -> u32 {
    let window_ms = window.as_millis().max(1) as u64;
    let latency_ms = (latency.as_millis() as u64).min(window_ms);
    let bonus = (u64::from(config.time_bonus_max) * (window_ms - latency_ms)) / window_ms;
    config.base_points + bonus as u32
}
