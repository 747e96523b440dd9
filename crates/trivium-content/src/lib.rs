//! Question content adapter for Trivium.
//!
//! The quiz platform stores collections of questions in a relational store
//! that is NOT this crate's concern. The orchestrator consumes exactly one
//! operation from that collaborator — "give me the ordered questions for a
//! collection" — and this crate defines that seam:
//!
//! - [`ContentSource`] — the trait the storage layer implements
//! - [`Question`] — the read-only shape the orchestrator snapshots
//! - [`StaticContent`] — an in-memory source for development and tests
//! - [`ContentError`] — what can go wrong
//!
//! The orchestrator never mutates content and takes an immutable snapshot
//! at game start, so mid-game edits in the store never affect a running
//! room.

#![allow(async_fn_in_trait)]

mod error;

pub use error::ContentError;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trivium_protocol::CollectionId;

/// One multiple-choice question as supplied by the content collaborator.
///
/// `options` is ordered; `correct_index` points into it. The authoring
/// surface enforces four options per question, but the orchestrator only
/// relies on `correct_index` being in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to every participant.
    pub text: String,
    /// The answer choices, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct choice.
    pub correct_index: usize,
}

impl Question {
    /// Whether `choice` is the correct option.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }
}

/// Supplies ordered questions for a collection.
///
/// Implemented by the storage layer in production and by [`StaticContent`]
/// in development. The fetch is the only awaited operation in the whole
/// start-game path, and it is performed BEFORE the room's serialized
/// section — the room actor only ever sees already-fetched questions.
///
/// # Example
///
/// ```rust
/// use trivium_content::{ContentError, ContentSource, Question};
/// use trivium_protocol::CollectionId;
///
/// /// Serves one hardcoded collection. Enough for a smoke test.
/// struct OneLiner;
///
/// impl ContentSource for OneLiner {
///     async fn load_questions(
///         &self,
///         collection: &CollectionId,
///     ) -> Result<Vec<Question>, ContentError> {
///         if collection.0 != "demo" {
///             return Err(ContentError::NotFound(collection.clone()));
///         }
///         Ok(vec![Question {
///             text: "2 + 2?".into(),
///             options: vec!["3".into(), "4".into(), "5".into(), "22".into()],
///             correct_index: 1,
///         }])
///     }
/// }
/// ```
pub trait ContentSource: Send + Sync + 'static {
    /// Loads the ordered questions of `collection`.
    ///
    /// # Errors
    /// - [`ContentError::NotFound`] — no such collection
    /// - [`ContentError::Empty`] — the collection holds no questions
    fn load_questions(
        &self,
        collection: &CollectionId,
    ) -> impl std::future::Future<Output = Result<Vec<Question>, ContentError>> + Send;
}

// ---------------------------------------------------------------------------
// StaticContent
// ---------------------------------------------------------------------------

/// An in-memory [`ContentSource`] for development and tests.
///
/// Collections are registered up front with [`with_collection`]
/// (builder-style) and served verbatim.
///
/// [`with_collection`]: StaticContent::with_collection
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    collections: HashMap<CollectionId, Vec<Question>>,
}

impl StaticContent {
    /// Creates an empty source (every lookup fails with `NotFound`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection, replacing any previous one with the same id.
    pub fn with_collection(
        mut self,
        id: impl Into<String>,
        questions: Vec<Question>,
    ) -> Self {
        self.collections.insert(CollectionId(id.into()), questions);
        self
    }
}

impl ContentSource for StaticContent {
    async fn load_questions(
        &self,
        collection: &CollectionId,
    ) -> Result<Vec<Question>, ContentError> {
        let questions = self
            .collections
            .get(collection)
            .ok_or_else(|| ContentError::NotFound(collection.clone()))?;
        if questions.is_empty() {
            return Err(ContentError::Empty(collection.clone()));
        }
        Ok(questions.clone())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn geography() -> Vec<Question> {
        vec![
            Question {
                text: "Capital of France?".into(),
                options: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
                correct_index: 0,
            },
            Question {
                text: "Longest river?".into(),
                options: vec!["Amazon".into(), "Nile".into(), "Yangtze".into(), "Danube".into()],
                correct_index: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_load_questions_known_collection_returns_ordered() {
        let content = StaticContent::new().with_collection("geo", geography());

        let questions = content
            .load_questions(&CollectionId("geo".into()))
            .await
            .expect("should load");

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Capital of France?");
        assert_eq!(questions[1].correct_index, 1);
    }

    #[tokio::test]
    async fn test_load_questions_unknown_collection_returns_not_found() {
        let content = StaticContent::new();

        let result = content.load_questions(&CollectionId("nope".into())).await;

        assert!(matches!(result, Err(ContentError::NotFound(c)) if c.0 == "nope"));
    }

    #[tokio::test]
    async fn test_load_questions_empty_collection_returns_empty() {
        let content = StaticContent::new().with_collection("hollow", vec![]);

        let result = content.load_questions(&CollectionId("hollow".into())).await;

        assert!(matches!(result, Err(ContentError::Empty(_))));
    }

    #[test]
    fn test_question_is_correct() {
        let q = geography().remove(0);
        assert!(q.is_correct(0));
        assert!(!q.is_correct(1));
        assert!(!q.is_correct(99));
    }

    #[test]
    fn test_question_round_trips_through_json() {
        let q = geography().remove(1);
        let json = serde_json::to_string(&q).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }
}
