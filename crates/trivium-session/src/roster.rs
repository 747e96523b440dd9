//! The roster: one room's players, their connections, and their progress.
//!
//! Owned by the room actor, which serializes every mutation. The roster
//! guarantees:
//! - at most one live connection per (room, token) pair at any instant
//! - identity continuity (score, prior answers) across any reconnection
//!   within the grace period
//! - insertion order preserved, so the leaderboard tie-break by join time
//!   is deterministic

use std::time::{Duration, Instant};

use trivium_protocol::{
    PlayerId, PlayerSummary, PlayerToken, RankedEntry, ServerEvent,
};
use trivium_transport::ConnectionId;

use crate::player::Link;
use crate::{Answer, EventSink, Player, RosterError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Roster behavior knobs.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    /// How long a disconnected player's entry survives before removal.
    /// Default: 30 seconds. Zero disables reconnection entirely.
    pub reconnect_grace: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// Attach outcomes
// ---------------------------------------------------------------------------

/// What happened when a connection presented a token.
///
/// All three cases succeed — identity conflicts are resolved here, not
/// surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The token was new (or its previous entry had already aged out):
    /// a fresh player with zero score.
    Joined(PlayerId),

    /// The token belonged to a disconnected member within the grace
    /// period: the existing player, score and answers intact.
    Reconnected(PlayerId),

    /// The token was already connected elsewhere: the new connection wins
    /// and `stale` no longer maps to any player.
    Superseded {
        id: PlayerId,
        stale: ConnectionId,
    },
}

impl AttachOutcome {
    /// The player id involved, whichever way the attach resolved.
    pub fn id(&self) -> PlayerId {
        match self {
            Self::Joined(id) | Self::Reconnected(id) => *id,
            Self::Superseded { id, .. } => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// All players of one room, in join order.
///
/// Rooms hold tens of players, so membership lookups are linear scans over
/// the ordered `Vec` — simpler than a map plus a separate ordering, and
/// removal preserves order for free.
pub struct Roster {
    players: Vec<Player>,
    next_seat: u64,
    grace: Duration,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new(config: RosterConfig) -> Self {
        Self {
            players: Vec::new(),
            next_seat: 1,
            grace: config.reconnect_grace,
        }
    }

    /// Binds a connection to the player identified by `token`.
    ///
    /// Resolution order:
    /// 1. token unknown → new player ([`AttachOutcome::Joined`])
    /// 2. token disconnected within grace → rebind, keep score/answers
    ///    ([`AttachOutcome::Reconnected`])
    /// 3. token disconnected past grace → the sweep just hasn't run yet;
    ///    drop the stale entry and treat as new
    /// 4. token already connected → new connection wins
    ///    ([`AttachOutcome::Superseded`])
    pub fn attach(
        &mut self,
        conn: ConnectionId,
        sink: EventSink,
        token: PlayerToken,
        name: String,
        avatar: Option<String>,
    ) -> AttachOutcome {
        if let Some(idx) = self.players.iter().position(|p| p.token == token) {
            let overdue = self.players[idx]
                .disconnected_at
                .is_some_and(|t| t.elapsed() >= self.grace);

            if overdue {
                // Raced with the expiry sweep; the entry is already dead.
                self.players.remove(idx);
            } else {
                let player = &mut self.players[idx];
                let prev = player.link.replace(Link { conn, sink });
                player.disconnected_at = None;
                player.name = name;
                player.avatar = avatar;

                return match prev {
                    Some(old) => {
                        tracing::info!(
                            id = %player.id,
                            old = %old.conn,
                            new = %conn,
                            "duplicate identity, new connection wins"
                        );
                        AttachOutcome::Superseded {
                            id: player.id,
                            stale: old.conn,
                        }
                    }
                    None => {
                        tracing::info!(id = %player.id, %conn, "player reconnected");
                        AttachOutcome::Reconnected(player.id)
                    }
                };
            }
        }

        let id = PlayerId(self.next_seat);
        self.next_seat += 1;
        self.players.push(Player::new(
            id,
            token,
            name,
            avatar,
            Link { conn, sink },
        ));
        tracing::info!(%id, %conn, players = self.players.len(), "player joined");
        AttachOutcome::Joined(id)
    }

    /// Marks the player bound to `conn` as disconnected, starting the
    /// grace period. Returns the affected player id.
    ///
    /// A connection that was superseded no longer matches any link and is
    /// ignored — its late disconnect must not unbind the live connection.
    pub fn detach(&mut self, conn: ConnectionId) -> Option<PlayerId> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.link.as_ref().is_some_and(|l| l.conn == conn))?;

        player.link = None;
        player.disconnected_at = Some(Instant::now());
        tracing::info!(id = %player.id, %conn, "player disconnected, grace period started");
        Some(player.id)
    }

    /// Removes a player outright (explicit leave — no grace period).
    pub fn remove(&mut self, token: &PlayerToken) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.token == *token)?;
        let player = self.players.remove(idx);
        tracing::info!(id = %player.id, players = self.players.len(), "player left");
        Some(player)
    }

    /// Removes every disconnected player whose grace period has elapsed,
    /// returning the removed entries so the caller can react (host
    /// transfer, roster broadcast) before they are forgotten.
    pub fn expire_overdue(&mut self) -> Vec<Player> {
        let grace = self.grace;
        let mut removed = Vec::new();
        self.players.retain(|p| {
            let overdue = p.link.is_none()
                && p.disconnected_at.is_some_and(|t| t.elapsed() >= grace);
            if overdue {
                tracing::info!(id = %p.id, "reconnection grace elapsed, removing player");
                removed.push(p.clone());
            }
            !overdue
        });
        removed
    }

    /// Records an answer for `token`. First write per question index wins.
    pub fn record_answer(
        &mut self,
        token: &PlayerToken,
        question_index: usize,
        choice: usize,
        latency: Duration,
    ) -> Result<(), RosterError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.token == *token)
            .ok_or_else(|| RosterError::UnknownPlayer(token.clone()))?;

        use std::collections::hash_map::Entry;
        match player.answers.entry(question_index) {
            Entry::Occupied(_) => {
                Err(RosterError::AlreadyAnswered { question_index })
            }
            Entry::Vacant(slot) => {
                slot.insert(Answer { choice, latency });
                Ok(())
            }
        }
    }

    /// Adds a score delta to a player. Scores only ever grow.
    pub fn add_score(&mut self, token: &PlayerToken, delta: u32) {
        if let Some(player) =
            self.players.iter_mut().find(|p| p.token == *token)
        {
            player.score += delta;
        }
    }

    /// Whether every currently-connected player has answered
    /// `question_index`. Disconnected players are excluded so a dropped
    /// connection can neither stall nor shortcut the room; with nobody
    /// connected at all this is `false` (the deadline still advances).
    pub fn all_connected_answered(&self, question_index: usize) -> bool {
        let mut connected = 0;
        for p in &self.players {
            if p.connected() {
                connected += 1;
                if !p.answers.contains_key(&question_index) {
                    return false;
                }
            }
        }
        connected > 0
    }

    /// The earliest-joined connected player (host succession order).
    pub fn earliest_connected(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.connected())
    }

    /// Looks up a player by token.
    pub fn get(&self, token: &PlayerToken) -> Option<&Player> {
        self.players.iter().find(|p| p.token == *token)
    }

    /// All players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Total members, connected or not.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster has no members at all.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// How many members currently hold a live connection.
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected()).count()
    }

    /// Sends an event to every connected player. Sinks whose handler is
    /// gone are silently skipped; the detach path cleans them up.
    pub fn broadcast(&self, event: &ServerEvent) {
        for p in &self.players {
            if let Some(link) = &p.link {
                let _ = link.sink.send(event.clone());
            }
        }
    }

    /// Sends an event to a single player, if connected.
    pub fn send_to(&self, token: &PlayerToken, event: ServerEvent) {
        if let Some(link) = self.get(token).and_then(|p| p.link.as_ref()) {
            let _ = link.sink.send(event);
        }
    }

    /// Presentation snapshots for a `room_state` broadcast, in join order.
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(Player::summary).collect()
    }

    /// The leaderboard: score descending, join order breaking ties.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        let mut sorted: Vec<&Player> = self.players.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, p)| RankedEntry {
                rank: i + 1,
                id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}

// =========================================================================
// Tests
// =========================================================================
