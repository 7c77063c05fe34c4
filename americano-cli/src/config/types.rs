use americano_adaptive::AdaptiveConfig;
use americano_extraction::ExtractionConfig;
use americano_resilience::ResilienceConfig;
use americano_server::ServerConfig;
use serde::{Deserialize, Serialize};

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AmericanoConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub adaptive: AdaptiveConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Retry and circuit breaker settings for the content service
    #[serde(default)]
    pub resilience: ResilienceConfig,
}
