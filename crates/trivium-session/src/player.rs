//! Player types: one room member's identity, connection, and progress.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use trivium_protocol::{PlayerId, PlayerSummary, PlayerToken, ServerEvent};
use trivium_transport::ConnectionId;

/// Channel sender delivering outbound events to one player's connection
/// handler. Unbounded: broadcasts must never block the room actor, and a
/// handler that stops draining is torn down by the transport anyway.
pub type EventSink = mpsc::UnboundedSender<ServerEvent>;

/// A recorded answer: which choice, and how long after the question opened
/// it arrived. At most one per question index — first write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    /// Index into the question's options.
    pub choice: usize,
    /// Time from question open to submission.
    pub latency: Duration,
}

/// The live binding between a player and their current connection.
#[derive(Debug, Clone)]
pub(crate) struct Link {
    pub(crate) conn: ConnectionId,
    pub(crate) sink: EventSink,
}

/// One member of a room.
///
/// Identity is the durable `token`; `id` is the public per-room seat
/// number assigned in join order (which doubles as the leaderboard
/// tie-break). A disconnected player keeps their entry — score, answers
/// and all — until the reconnection grace period runs out.
#[derive(Debug, Clone)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) token: PlayerToken,
    pub(crate) name: String,
    pub(crate) avatar: Option<String>,
    pub(crate) link: Option<Link>,
    pub(crate) score: u32,
    pub(crate) answers: HashMap<usize, Answer>,
    /// Set while disconnected; drives grace-period expiry.
    pub(crate) disconnected_at: Option<Instant>,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        token: PlayerToken,
        name: String,
        avatar: Option<String>,
        link: Link,
    ) -> Self {
        Self {
            id,
            token,
            name,
            avatar,
            link: Some(link),
            score: 0,
            answers: HashMap::new(),
            disconnected_at: None,
        }
    }

    /// The public per-room id.
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// The durable identity token.
    pub fn token(&self) -> &PlayerToken {
        &self.token
    }

    /// Display name (presentation only, never identity).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Avatar URL, if the client supplied one.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Total score so far. Monotonically non-decreasing.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether a live connection is currently bound.
    pub fn connected(&self) -> bool {
        self.link.is_some()
    }

    /// The recorded answer for a question index, if any.
    pub fn answer(&self, question_index: usize) -> Option<Answer> {
        self.answers.get(&question_index).copied()
    }

    /// How many questions this player has answered.
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// The presentation snapshot included in `room_state` broadcasts.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            score: self.score,
            connected: self.connected(),
        }
    }
}
