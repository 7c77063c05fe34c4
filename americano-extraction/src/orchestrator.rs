//! Batch concept extraction with per-chunk failure isolation.
//!
//! ```text
//! BatchExtractor::extract(chunks, cancel)
//!     │
//!     ├─ up to max_concurrency chunks in flight
//!     │     └─ ResilientCaller::call(breaker, cancel, generate → parse)
//!     │           ├─ Ok        → chunk succeeded
//!     │           └─ Err(...)  → chunk failed, batch continues
//!     │
//!     ├─ results kept in input order → BatchSummary
//!     │
//!     └─ every chunk failed → Err(AllChunksFailed | CircuitOpen)
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use americano_resilience::{
    CallError, CircuitBreaker, CircuitOpen, CircuitRegistry, ResilientCaller,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, Result};
use crate::generator::{ContentGenerator, GenerateError, GenerationContext};
use crate::prompt::{concept_prompt, parse_concepts};
use crate::stats::ExtractionStats;
use crate::types::{BatchChunkResult, BatchOutcome, BatchSummary, ContentChunk, ExtractedConcept};

/// Runs concept extraction over batches of lecture chunks.
pub struct BatchExtractor {
    generator: Arc<dyn ContentGenerator>,
    caller: ResilientCaller,
    circuits: Arc<CircuitRegistry>,
    config: ExtractionConfig,
    stats: Mutex<ExtractionStats>,
}

impl std::fmt::Debug for BatchExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchExtractor")
            .field("generator", &self.generator.name())
            .field("caller", &self.caller)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BatchExtractor {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        caller: ResilientCaller,
        circuits: Arc<CircuitRegistry>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            generator,
            caller,
            circuits,
            config,
            stats: Mutex::new(ExtractionStats::default()),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Totals across every batch this extractor has run.
    pub fn stats(&self) -> ExtractionStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Extract concepts from every chunk.
    ///
    /// A failed chunk never aborts the batch. The result is an error only
    /// when extraction is disabled or no chunk succeeded; cancellation
    /// returns the partial summary with outcome `Cancelled`.
    pub async fn extract(
        &self,
        chunks: Vec<ContentChunk>,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        if !self.config.enabled {
            return Err(ExtractionError::Disabled);
        }

        let batch_id = Uuid::now_v7();
        let started_at = Utc::now();
        let breaker = self.circuits.breaker(&self.config.circuit_key);
        let concurrency = self.config.max_concurrency.max(1);

        info!(
            batch_id = %batch_id,
            chunks = chunks.len(),
            concurrency,
            generator = self.generator.name(),
            "Starting batch extraction"
        );

        // Futures are built up front so the stream item type is not tied to
        // a borrow of the closure argument
        let pending: Vec<_> = chunks
            .iter()
            .map(|chunk| self.extract_chunk(&breaker, chunk, cancel))
            .collect();
        let results: Vec<BatchChunkResult> = stream::iter(pending)
            .buffered(concurrency)
            .collect()
            .await;

        let summary = BatchSummary::from_results(batch_id, results, started_at);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&summary);

        info!(
            batch_id = %batch_id,
            outcome = %summary.outcome,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            circuit_rejections = summary.circuit_rejections(),
            duration_ms = summary.duration_ms(),
            "Batch extraction finished"
        );

        if summary.outcome == BatchOutcome::Failed {
            if summary.results.iter().all(|r| r.circuit_open) {
                let retry_in = breaker.snapshot().retry_in_ms.unwrap_or(0);
                return Err(ExtractionError::CircuitOpen(CircuitOpen {
                    key: breaker.key().to_string(),
                    retry_in: Duration::from_millis(retry_in),
                }));
            }
            return Err(ExtractionError::AllChunksFailed {
                summary: Box::new(summary),
            });
        }

        Ok(summary)
    }

    async fn extract_chunk(
        &self,
        breaker: &CircuitBreaker,
        chunk: &ContentChunk,
        cancel: &CancellationToken,
    ) -> BatchChunkResult {
        let prompt = concept_prompt(chunk);
        let context = GenerationContext {
            chunk_id: Some(chunk.id.clone()),
            source: chunk.source.clone(),
        };

        let result = self
            .caller
            .call(breaker, cancel, |attempt| self.attempt(attempt, &prompt, &context))
            .await;

        match result {
            Ok(outcome) => {
                debug!(
                    chunk = %chunk.id,
                    attempts = outcome.attempts,
                    concepts = outcome.value.len(),
                    "Chunk extracted"
                );
                BatchChunkResult::success(chunk.id.clone(), outcome.attempts, outcome.value)
            }
            Err(CallError::CircuitOpen(open)) => {
                debug!(chunk = %chunk.id, "Chunk rejected by open circuit");
                BatchChunkResult::circuit_rejected(chunk.id.clone(), open.to_string())
            }
            Err(CallError::Cancelled { attempts }) => {
                BatchChunkResult::cancelled(chunk.id.clone(), attempts)
            }
            Err(err) => {
                warn!(chunk = %chunk.id, attempts = err.attempts(), error = %err, "Chunk extraction failed");
                BatchChunkResult::failure(
                    chunk.id.clone(),
                    err.attempts(),
                    err.to_string(),
                    err.failure_kind(),
                )
            }
        }
    }

    async fn attempt(
        &self,
        attempt: u32,
        prompt: &str,
        context: &GenerationContext,
    ) -> std::result::Result<Vec<ExtractedConcept>, GenerateError> {
        if attempt > 1 {
            debug!(chunk = ?context.chunk_id, attempt, "Retrying chunk");
        }
        let content = self.generator.generate(prompt, context).await?;
        parse_concepts(&content.text, self.config.min_concept_name_len)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use americano_resilience::{CircuitBreakerConfig, RetryPolicy};
    use async_trait::async_trait;

    use super::*;
    use crate::types::GeneratedContent;

    /// Fails chunks whose text contains "fail", tracks peak concurrency.
    struct ScriptedGenerator {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            prompt: &str,
            _context: &GenerationContext,
        ) -> std::result::Result<GeneratedContent, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if prompt.contains("fail") {
                Err(GenerateError::Http {
                    status: 400,
                    body: "bad request".into(),
                })
            } else {
                Ok(GeneratedContent::new(r#"["Cardiac output"]"#))
            }
        }
    }

    fn extractor(generator: Arc<dyn ContentGenerator>, config: ExtractionConfig) -> BatchExtractor {
        BatchExtractor::new(
            generator,
            ResilientCaller::new(RetryPolicy::default()),
            Arc::new(CircuitRegistry::new(CircuitBreakerConfig {
                enabled: true,
                failure_threshold: 100,
                reset_timeout_ms: 1_000,
            })),
            config,
        )
    }

    fn chunks(texts: &[&str]) -> Vec<ContentChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ContentChunk::new(format!("c{}", i + 1), *t))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let generator = Arc::new(ScriptedGenerator::new());
        let extractor = extractor(generator.clone(), ExtractionConfig::new().with_max_concurrency(2));

        let summary = extractor
            .extract(chunks(&["a", "b", "c", "d", "e", "f"]), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 6);
        assert!(generator.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_input_order() {
        let extractor = extractor(Arc::new(ScriptedGenerator::new()), ExtractionConfig::default());
        let summary = extractor
            .extract(chunks(&["a", "fail", "c"]), &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<_> = summary.results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(summary.outcome, BatchOutcome::PartialFailure);
        assert!(!summary.results[1].succeeded);
        assert_eq!(summary.results[1].attempts, 1);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_extract_future_is_send() {
        let extractor = extractor(Arc::new(ScriptedGenerator::new()), ExtractionConfig::default());
        let cancel = CancellationToken::new();
        assert_send(extractor.extract(chunks(&["a"]), &cancel));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_runs_on_spawned_task() {
        let extractor = Arc::new(extractor(
            Arc::new(ScriptedGenerator::new()),
            ExtractionConfig::default(),
        ));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let extractor = Arc::clone(&extractor);
            async move { extractor.extract(chunks(&["a", "b"]), &cancel).await }
        });

        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.succeeded, 2);
    }

    #[tokio::test]
    async fn test_disabled_extractor() {
        let extractor = extractor(
            Arc::new(ScriptedGenerator::new()),
            ExtractionConfig::new().with_enabled(false),
        );
        let err = extractor
            .extract(chunks(&["a"]), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Disabled));
    }

    #[tokio::test]
    async fn test_empty_batch_succeeds() {
        let extractor = extractor(Arc::new(ScriptedGenerator::new()), ExtractionConfig::default());
        let summary = extractor
            .extract(Vec::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.outcome, BatchOutcome::Succeeded);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let generator = Arc::new(ScriptedGenerator::new());
        let extractor = extractor(generator.clone(), ExtractionConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = extractor.extract(chunks(&["a", "b"]), &cancel).await.unwrap();
        assert_eq!(summary.outcome, BatchOutcome::Cancelled);
        assert!(summary.results.iter().all(|r| r.cancelled));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        // Cancellation is not a failure for the circuit
        let breaker = extractor.circuits.breaker("content-generation");
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_accumulate() {
        let extractor = extractor(Arc::new(ScriptedGenerator::new()), ExtractionConfig::default());
        let cancel = CancellationToken::new();
        extractor.extract(chunks(&["a", "b"]), &cancel).await.unwrap();
        extractor.extract(chunks(&["c", "fail"]), &cancel).await.unwrap();

        let stats = extractor.stats();
        assert_eq!(stats.batches.total(), 2);
        assert_eq!(stats.chunks_total, 4);
        assert_eq!(stats.chunks_failed, 1);
        assert_eq!(stats.concepts_extracted, 3);
    }
}
