//! Core types for concept extraction.

use std::collections::HashMap;

use americano_resilience::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// String wrapper for lecture chunk identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(String);

impl ChunkId {
    /// Create a chunk ID from a string.
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

impl From<String> for ChunkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChunkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A piece of lecture content to extract concepts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub id: ChunkId,
    pub text: String,
    /// Lecture or file the chunk came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ContentChunk {
    /// Create a chunk.
    pub fn new(id: impl Into<ChunkId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: None,
        }
    }

    /// Set the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Split text into one chunk per blank-line separated paragraph.
    ///
    /// IDs are `{prefix}-{n}`, 1-indexed. Empty paragraphs are skipped.
    pub fn paragraphs(prefix: &str, text: &str) -> Vec<Self> {
        text.split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, p)| Self::new(format!("{prefix}-{}", i + 1), p).with_source(prefix))
            .collect()
    }
}

/// A medical concept named in a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedConcept {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ExtractedConcept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case- and whitespace-insensitive key for merging.
    pub fn normalized_name(&self) -> String {
        self.name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// Raw output of the content-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GeneratedContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }
}

/// Per-chunk result within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchChunkResult {
    pub chunk_id: ChunkId,
    pub succeeded: bool,
    /// Calls made to the generator. Zero if rejected by the circuit or cancelled first.
    pub attempts: u32,
    pub extracted_concepts: Vec<ExtractedConcept>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Classification of the failure, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    /// The circuit rejected the call without trying.
    #[serde(default)]
    pub circuit_open: bool,
    /// The batch was cancelled before this chunk finished.
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchChunkResult {
    pub fn success(chunk_id: ChunkId, attempts: u32, concepts: Vec<ExtractedConcept>) -> Self {
        Self {
            chunk_id,
            succeeded: true,
            attempts,
            extracted_concepts: concepts,
            error: None,
            failure_kind: None,
            circuit_open: false,
            cancelled: false,
        }
    }

    pub fn failure(
        chunk_id: ChunkId,
        attempts: u32,
        error: impl Into<String>,
        failure_kind: Option<FailureKind>,
    ) -> Self {
        Self {
            chunk_id,
            succeeded: false,
            attempts,
            extracted_concepts: Vec::new(),
            error: Some(error.into()),
            failure_kind,
            circuit_open: false,
            cancelled: false,
        }
    }

    pub fn circuit_rejected(chunk_id: ChunkId, error: impl Into<String>) -> Self {
        Self {
            circuit_open: true,
            ..Self::failure(chunk_id, 0, error, None)
        }
    }

    pub fn cancelled(chunk_id: ChunkId, attempts: u32) -> Self {
        Self {
            cancelled: true,
            ..Self::failure(chunk_id, attempts, "cancelled", None)
        }
    }
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every chunk succeeded.
    Succeeded,
    /// Some chunks failed, at least one succeeded.
    PartialFailure,
    /// No chunk succeeded.
    Failed,
    /// The batch was cancelled before every chunk finished.
    Cancelled,
}

impl BatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::PartialFailure => "partial_failure",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a batch: counts plus per-chunk detail in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub outcome: BatchOutcome,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchChunkResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    /// Build a summary from per-chunk results.
    pub fn from_results(
        batch_id: Uuid,
        results: Vec<BatchChunkResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|r| r.succeeded).count();
        let failed = total - succeeded;
        let outcome = if results.iter().any(|r| r.cancelled) {
            BatchOutcome::Cancelled
        } else if failed == 0 {
            BatchOutcome::Succeeded
        } else if succeeded == 0 {
            BatchOutcome::Failed
        } else {
            BatchOutcome::PartialFailure
        };

        Self {
            batch_id,
            outcome,
            total,
            succeeded,
            failed,
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Chunks that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchChunkResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }

    /// Calls rejected by the circuit breaker.
    pub fn circuit_rejections(&self) -> usize {
        self.results.iter().filter(|r| r.circuit_open).count()
    }

    /// Generator calls made across all chunks.
    pub fn total_attempts(&self) -> u64 {
        self.results.iter().map(|r| u64::from(r.attempts)).sum()
    }

    /// Concepts from every successful chunk, merged by normalized name.
    ///
    /// The first occurrence wins; later ones only fill in a missing
    /// description or category. Order is first appearance.
    pub fn unique_concepts(&self) -> Vec<ExtractedConcept> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<ExtractedConcept> = Vec::new();

        for concept in self.results.iter().flat_map(|r| &r.extracted_concepts) {
            let key = concept.normalized_name();
            match index.get(&key) {
                Some(&i) => {
                    let existing = &mut merged[i];
                    if existing.description.is_none() {
                        existing.description.clone_from(&concept.description);
                    }
                    if existing.category.is_none() {
                        existing.category.clone_from(&concept.category);
                    }
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(concept.clone());
                }
            }
        }
        merged
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
