//! Registry of named circuit breakers.
//!
//! Constructed once per process (or per test) and shared through `Arc`.
//! Breakers are created lazily on first use and live as long as the registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::circuit_breaker::{CircuitBreaker, CircuitSnapshot};
use crate::config::{CircuitBreakerConfig, ResilienceConfig};

/// Named circuit breakers keyed by logical endpoint.
pub struct CircuitRegistry {
    defaults: CircuitBreakerConfig,
    overrides: HashMap<String, CircuitBreakerConfig>,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitRegistry {
    /// Create a registry whose breakers use `defaults`.
    pub fn new(defaults: CircuitBreakerConfig) -> Self {
        Self {
            defaults,
            overrides: HashMap::new(),
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry from configuration, including per-key overrides.
    pub fn from_config(config: &ResilienceConfig) -> Self {
        config
            .circuits
            .iter()
            .fold(Self::new(config.circuit_breaker.clone()), |registry, (key, circuit)| {
                registry.with_override(key.clone(), circuit.clone())
            })
    }

    /// Use a specific configuration for one key.
    #[must_use]
    pub fn with_override(mut self, key: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        self.overrides.insert(key.into(), config);
        self
    }

    /// Get or create the breaker for `key`.
    pub fn breaker(&self, key: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.get(key) {
            return breaker;
        }

        let mut breakers = self
            .breakers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(breakers.entry(key.to_string()).or_insert_with(|| {
            let config = self
                .overrides
                .get(key)
                .cloned()
                .unwrap_or_else(|| self.defaults.clone());
            tracing::debug!(key, threshold = config.failure_threshold, "Created circuit breaker");
            Arc::new(CircuitBreaker::new(key, config))
        }))
    }

    /// Get the breaker for `key` if it exists.
    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Snapshots of every known circuit, sorted by key.
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        let mut snapshots: Vec<_> = self
            .breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|b| b.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.key.cmp(&b.key));
        snapshots
    }

    /// Number of circuits created so far.
    pub fn len(&self) -> usize {
        self.breakers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no circuits have been created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl std::fmt::Debug for CircuitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitRegistry")
            .field("defaults", &self.defaults)
            .field("overrides", &self.overrides.len())
            .field("circuits", &self.len())
            .finish()
    }
}
