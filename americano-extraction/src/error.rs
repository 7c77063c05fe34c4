//! Error types for americano-extraction

use americano_resilience::CircuitOpen;
use thiserror::Error;

use crate::types::BatchSummary;

/// Batch-level extraction errors.
///
/// Per-chunk failures are recorded in the [`BatchSummary`]; only failures of
/// the batch as a whole surface here.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Extraction is switched off in configuration
    #[error("Extraction is disabled")]
    Disabled,

    /// Every chunk was rejected by an open circuit
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpen),

    /// Every chunk failed
    #[error("All {} chunks failed", summary.total)]
    AllChunksFailed { summary: Box<BatchSummary> },

    /// The HTTP client could not be built
    #[error("Client error: {0}")]
    Client(String),
}

impl ExtractionError {
    /// Summary of the failed batch, if there is one.
    pub fn summary(&self) -> Option<&BatchSummary> {
        match self {
            Self::AllChunksFailed { summary } => Some(summary),
            _ => None,
        }
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::types::{BatchChunkResult, ChunkId};

    #[test]
    fn test_error_display() {
        let summary = BatchSummary::from_results(
            Uuid::now_v7(),
            vec![
                BatchChunkResult::failure(ChunkId::new("a"), 1, "x", None),
                BatchChunkResult::failure(ChunkId::new("b"), 1, "y", None),
            ],
            Utc::now(),
        );
        let err = ExtractionError::AllChunksFailed {
            summary: Box::new(summary),
        };
        assert_eq!(err.to_string(), "All 2 chunks failed");
        assert_eq!(err.summary().map(|s| s.failed), Some(2));

        let err = ExtractionError::from(CircuitOpen {
            key: "content-generation".into(),
            retry_in: Duration::from_millis(1500),
        });
        assert_eq!(
            err.to_string(),
            "circuit 'content-generation' is open, retry in 1500ms"
        );
    }
}
