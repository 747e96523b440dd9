//! Error types for the content adapter.

use trivium_protocol::{CollectionId, ErrorKind};

/// Failures the content collaborator can report.
///
/// Either failure aborts a `start_game`, keeps the room in its lobby, and
/// is reported to the host only — never broadcast.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// No collection with this id exists.
    #[error("collection {0} not found")]
    NotFound(CollectionId),

    /// The collection exists but contains no questions.
    #[error("collection {0} has no questions")]
    Empty(CollectionId),
}

impl ContentError {
    /// The wire-level error category for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::ContentNotFound,
            Self::Empty(_) => ErrorKind::ContentEmpty,
        }
    }
}
