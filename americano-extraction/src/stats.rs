//! Running totals across extraction batches.
//!
//! ```ignore
//! let mut stats = ExtractionStats::default();
//! stats.record(&summary);
//! println!("{:.0}% of chunks succeeded", stats.success_rate() * 100.0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BatchOutcome, BatchSummary};

/// Counts by batch outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub succeeded: u64,
    pub partial_failure: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl OutcomeCounts {
    pub fn increment(&mut self, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Succeeded => self.succeeded += 1,
            BatchOutcome::PartialFailure => self.partial_failure += 1,
            BatchOutcome::Failed => self.failed += 1,
            BatchOutcome::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.succeeded + self.partial_failure + self.failed + self.cancelled
    }
}

/// Accumulated extraction statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionStats {
    pub batches: OutcomeCounts,
    pub chunks_total: u64,
    pub chunks_succeeded: u64,
    pub chunks_failed: u64,
    /// Chunks rejected by an open circuit without a call
    pub circuit_rejections: u64,
    /// Generator calls, including retries
    pub attempts: u64,
    /// Concepts extracted, before de-duplication across batches
    pub concepts_extracted: u64,
    pub last_batch_at: Option<DateTime<Utc>>,
}

impl ExtractionStats {
    /// Fold a finished batch into the totals.
    pub fn record(&mut self, summary: &BatchSummary) {
        self.batches.increment(summary.outcome);
        self.chunks_total += summary.total as u64;
        self.chunks_succeeded += summary.succeeded as u64;
        self.chunks_failed += summary.failed as u64;
        self.circuit_rejections += summary.circuit_rejections() as u64;
        self.attempts += summary.total_attempts();
        self.concepts_extracted += summary
            .results
            .iter()
            .map(|r| r.extracted_concepts.len() as u64)
            .sum::<u64>();
        self.last_batch_at = Some(summary.finished_at);
    }

    /// Fraction of chunks that succeeded, 0.0 with no data.
    pub fn success_rate(&self) -> f64 {
        if self.chunks_total == 0 {
            0.0
        } else {
            self.chunks_succeeded as f64 / self.chunks_total as f64
        }
    }

    /// Mean generator calls per chunk that made at least one.
    pub fn mean_attempts(&self) -> f64 {
        let attempted = self.chunks_total.saturating_sub(self.circuit_rejections);
        if attempted == 0 {
            0.0
        } else {
            self.attempts as f64 / attempted as f64
        }
    }
}
