//! Error types for the room layer.

use trivium_protocol::{ErrorKind, RoomCode};
use trivium_session::RosterError;

/// Errors that can occur during room operations.
///
/// Per-request failures (everything except `CapacityExceeded`) are
/// reported only to the originating connection; none of them mutate room
/// state or produce a broadcast.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The registry is at its configured maximum of concurrent rooms.
    #[error("room capacity reached ({limit} rooms)")]
    CapacityExceeded { limit: usize },

    /// No active room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room's member cap was reached.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The command is illegal for the current phase, or the caller lacks
    /// the authority to issue it.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// An answer submission that cannot be recorded: wrong question
    /// index, out-of-range choice, or a duplicate.
    #[error("invalid answer: {0}")]
    InvalidAnswer(String),

    /// The room's command channel is closed — the actor has shut down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire-level error category for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::NotFound(_) => ErrorKind::RoomNotFound,
            Self::RoomFull(_) => ErrorKind::RoomFull,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::InvalidAnswer(_) => ErrorKind::InvalidAnswer,
            // A vanished room is indistinguishable from an unknown one.
            Self::Unavailable(_) => ErrorKind::RoomNotFound,
        }
    }
}

impl From<RosterError> for RoomError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::UnknownPlayer(token) => {
                Self::InvalidTransition(format!("player {token} is not in this room"))
            }
            RosterError::AlreadyAnswered { question_index } => Self::InvalidAnswer(
                format!("question {question_index} was already answered"),
            ),
        }
    }
}
