//! Extraction configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default circuit key for the content-generation service.
pub const DEFAULT_CIRCUIT_KEY: &str = "content-generation";

/// Batch extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Whether batch extraction is enabled
    pub enabled: bool,
    /// Chunks processed concurrently within one batch
    pub max_concurrency: usize,
    /// Circuit breaker key for generator calls
    pub circuit_key: String,
    /// Concept names shorter than this are dropped
    pub min_concept_name_len: usize,
    /// Content-generation service
    pub generator: GeneratorConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrency: 4,
            circuit_key: DEFAULT_CIRCUIT_KEY.to_string(),
            min_concept_name_len: 2,
            generator: GeneratorConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit (at least 1)
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Enable or disable extraction
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Content-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Base URL of the companion service
    pub endpoint: String,
    /// Model name passed through to the service
    pub model: Option<String>,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Environment variable holding the API key, if the service needs one
    pub api_key_env: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8001".to_string(),
            model: None,
            timeout_ms: 60_000,
            api_key_env: None,
        }
    }
}

impl GeneratorConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// API key read from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }
}
