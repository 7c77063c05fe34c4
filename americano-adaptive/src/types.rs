//! Identifier and observation types for adaptive assessment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scale;

/// String wrapper for assessment session identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a fresh random session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String wrapper for question identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Create a question ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One graded response. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityObservation {
    /// Item difficulty on the 0-100 display scale.
    pub difficulty: f64,
    /// Whether the learner answered correctly.
    pub correct: bool,
    /// When the response was given.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl AbilityObservation {
    /// Create an observation timestamped now.
    pub fn new(difficulty: f64, correct: bool) -> Self {
        Self {
            difficulty,
            correct,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a correct response.
    pub fn correct(difficulty: f64) -> Self {
        Self::new(difficulty, true)
    }

    /// Shorthand for an incorrect response.
    pub fn incorrect(difficulty: f64) -> Self {
        Self::new(difficulty, false)
    }

    /// Difficulty on the logit scale.
    pub fn difficulty_logit(&self) -> f64 {
        scale::to_logit(self.difficulty)
    }
}

/// A question from the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    /// Difficulty on the 0-100 display scale.
    pub difficulty: f64,
    /// Concept the question assesses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
}

impl Question {
    /// Create a question.
    pub fn new(id: impl Into<QuestionId>, prompt: impl Into<String>, difficulty: f64) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            difficulty,
            concept: None,
        }
    }

    /// Set the concept.
    #[must_use]
    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = Some(concept.into());
        self
    }
}

/// A stored response: which question was answered and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question_id: QuestionId,
    pub observation: AbilityObservation,
}
