//! Single-deadline, tag-carrying timer for Trivium room actors.
//!
//! Every timed quiz phase has exactly one pending deadline, and that
//! deadline must be cancelled and replaced on every phase transition so a
//! stale timer can never advance a room that has already moved on. The
//! [`PhaseTimer`] models this: at most one armed deadline, carrying a tag
//! describing the state it was issued for. When the deadline fires, the
//! caller compares the tag against its current state before acting — the
//! defensive second guard against cancellation races.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tag = timer.fired() => {
//!             if tag == current_tag { advance_phase(); }
//!         }
//!     }
//! }
//! ```
//!
//! While unarmed, [`PhaseTimer::fired`] pends forever — `select!` simply
//! keeps servicing the other branches. This mirrors a room sitting in its
//! lobby: no deadline, purely event-driven.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// A cancellable one-shot deadline carrying a caller-defined tag.
///
/// `T` is the tag type — typically a small `(phase, question index)` pair.
/// It must be `Copy + Eq` so the caller can cheaply validate a fired tag
/// against current state.
#[derive(Debug)]
pub struct PhaseTimer<T> {
    armed: Option<(Instant, T)>,
}

impl<T: Copy + Eq + std::fmt::Debug> PhaseTimer<T> {
    /// Creates an unarmed timer.
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Arms the timer to fire `after` from now, replacing any previous
    /// deadline. Replacement IS the cancellation mechanism: the old
    /// deadline and tag simply cease to exist.
    pub fn arm(&mut self, after: Duration, tag: T) {
        let at = Instant::now() + after;
        trace!(?tag, after_ms = after.as_millis() as u64, "deadline armed");
        self.armed = Some((at, tag));
    }

    /// Arms the timer to fire at an absolute instant.
    pub fn arm_at(&mut self, at: Instant, tag: T) {
        trace!(?tag, "deadline armed (absolute)");
        self.armed = Some((at, tag));
    }

    /// Disarms the timer. [`fired`](Self::fired) will pend forever until
    /// the next [`arm`](Self::arm).
    pub fn clear(&mut self) {
        if self.armed.take().is_some() {
            trace!("deadline cleared");
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The tag of the pending deadline, if any.
    pub fn tag(&self) -> Option<T> {
        self.armed.map(|(_, tag)| tag)
    }

    /// Time left until the pending deadline. `None` while unarmed,
    /// `Some(ZERO)` once the deadline has passed but not yet fired.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|(at, _)| at.saturating_duration_since(Instant::now()))
    }

    /// Waits until the pending deadline and returns its tag.
    ///
    /// Does NOT disarm: the caller transitions state and re-arms (or
    /// clears) as part of handling the fire. This keeps the method free of
    /// mutation, which makes it safe to drop mid-poll inside `select!`.
    ///
    /// While unarmed this future never resolves.
    pub async fn fired(&self) -> T {
        match self.armed {
            Some((at, tag)) => {
                time::sleep_until(at).await;
                tag
            }
            // Pend forever — select! keeps servicing other branches.
            None => std::future::pending().await,
        }
    }
}

impl<T: Copy + Eq + std::fmt::Debug> Default for PhaseTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}
