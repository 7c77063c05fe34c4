//! Resilience configuration types.
//!
//! Durations are stored as integer milliseconds so they read naturally in TOML.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for calls to an external service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Per-call retry settings.
    pub retry: RetryConfig,
    /// Shared circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Per-key breaker settings, replacing `circuit_breaker` for that key.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub circuits: BTreeMap<String, CircuitBreakerConfig>,
}

/// Retry settings for a single logical call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Upper bound for any single wait.
    pub max_delay_ms: u64,
    /// Relative jitter applied to each delay (0.1 = ±10%).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 30_000,
            jitter_ratio: 0.1,
        }
    }
}

impl RetryConfig {
    /// Base delay as a `Duration`.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Max delay as a `Duration`.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Whether the breaker gates calls at all.
    pub enabled: bool,
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is allowed.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
        }
    }
}

impl CircuitBreakerConfig {
    /// Reset timeout as a `Duration`.
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}
