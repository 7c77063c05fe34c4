//! Shared application state for the americano server

use std::sync::Arc;

use americano_adaptive::{
    AdaptiveConfig, AdaptiveEngine, InMemoryQuestionBank, InMemoryResponseStore,
};
use americano_extraction::{BatchExtractor, ContentGenerator, ExtractionConfig, HttpContentGenerator};
use americano_resilience::{CircuitRegistry, ResilienceConfig, ResilientCaller, RetryPolicy};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::ServerError;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Adaptive assessment sessions
    pub engine: Arc<AdaptiveEngine>,
    /// Batch concept extraction
    pub extractor: Arc<BatchExtractor>,
    /// Circuit breakers shared by every outbound call
    pub circuits: Arc<CircuitRegistry>,
    /// Cancelled on shutdown; in-flight batches derive child tokens from it
    pub shutdown: CancellationToken,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build state from configuration with in-memory repositories and the
    /// HTTP content generator
    pub fn from_config(
        adaptive: AdaptiveConfig,
        extraction: ExtractionConfig,
        resilience: &ResilienceConfig,
    ) -> Result<Self, ServerError> {
        let generator: Arc<dyn ContentGenerator> =
            Arc::new(HttpContentGenerator::new(&extraction.generator)?);
        Ok(Self::with_generator(adaptive, extraction, resilience, generator))
    }

    /// Build state around a given content generator
    pub fn with_generator(
        adaptive: AdaptiveConfig,
        extraction: ExtractionConfig,
        resilience: &ResilienceConfig,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let circuits = Arc::new(CircuitRegistry::from_config(resilience));
        let engine = Arc::new(AdaptiveEngine::new(
            adaptive,
            Arc::new(InMemoryResponseStore::new()),
            Arc::new(InMemoryQuestionBank::new()),
        ));
        let extractor = Arc::new(BatchExtractor::new(
            generator,
            ResilientCaller::new(RetryPolicy::new(&resilience.retry)),
            Arc::clone(&circuits),
            extraction,
        ));
        Self::with_components(engine, extractor, circuits)
    }

    /// Create AppState with custom components (for testing)
    pub fn with_components(
        engine: Arc<AdaptiveEngine>,
        extractor: Arc<BatchExtractor>,
        circuits: Arc<CircuitRegistry>,
    ) -> Self {
        Self {
            engine,
            extractor,
            circuits,
            shutdown: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_from_config() {
        let state = AppState::from_config(
            AdaptiveConfig::default(),
            ExtractionConfig::default(),
            &ResilienceConfig::default(),
        )
        .unwrap();
        assert!(state.uptime_seconds() >= 0);
        assert!(state.circuits.is_empty());
        assert!(!state.shutdown.is_cancelled());
    }

    #[test]
    fn test_app_state_applies_circuit_overrides() {
        let mut resilience = ResilienceConfig::default();
        resilience.circuits.insert(
            "content-generation".to_string(),
            americano_resilience::CircuitBreakerConfig {
                failure_threshold: 1,
                ..Default::default()
            },
        );

        let state = AppState::from_config(
            AdaptiveConfig::default(),
            ExtractionConfig::default(),
            &resilience,
        )
        .unwrap();

        let breaker = state.circuits.breaker("content-generation");
        assert_eq!(breaker.config().failure_threshold, 1);
    }
}
