//! Error types for americano-adaptive

use thiserror::Error;

use crate::types::{QuestionId, SessionId};

/// Error type for adaptive session operations.
///
/// Estimation edge cases (no data, clamped theta) are not errors; they are
/// reported in the estimate itself.
#[derive(Debug, Error)]
pub enum AdaptiveError {
    /// The question does not exist in the bank
    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),

    /// The session already has a response for this question
    #[error("Question {question} already answered in session {session}")]
    AlreadyAnswered {
        session: SessionId,
        question: QuestionId,
    },

    /// The session has no recorded responses
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Difficulty outside the 0-100 scale or not finite
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(f64),

    /// Backing store failed
    #[error("Repository error: {0}")]
    Repository(String),
}

/// Result type alias for adaptive operations
pub type Result<T> = std::result::Result<T, AdaptiveError>;
