//! Error types for the roster layer.

use trivium_protocol::PlayerToken;

/// Errors that can occur while recording roster state.
///
/// Connection churn (attach, detach, supersede, expiry) is not an error —
/// every such case has a defined outcome. Only answer bookkeeping can be
/// rejected.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The token is not a member of this room.
    #[error("player {0} is not in this room")]
    UnknownPlayer(PlayerToken),

    /// The player already answered this question; first write wins.
    #[error("question {question_index} was already answered")]
    AlreadyAnswered { question_index: usize },
}
