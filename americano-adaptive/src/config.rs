//! Adaptive assessment configuration.

use serde::{Deserialize, Serialize};

/// Configuration for adaptive assessment sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Newton-Raphson settings.
    pub estimator: EstimatorConfig,
    /// Early-stopping settings.
    pub stopping: StoppingConfig,
    /// Question count of the non-adaptive battery used for efficiency messaging.
    pub baseline_questions: u32,
    /// Display-scale ability at or above which a finished session counts as mastered.
    pub mastery_threshold: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            stopping: StoppingConfig::default(),
            baseline_questions: 15,
            mastery_threshold: 80.0,
        }
    }
}

/// Ability estimator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Iteration cap for Newton-Raphson.
    pub max_iterations: u32,
    /// Stop iterating once a step is smaller than this (logits).
    pub tolerance: f64,
    /// Theta is clamped to `[-theta_bound, theta_bound]` logits.
    pub theta_bound: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
            theta_bound: 4.0,
        }
    }
}

/// Early-stopping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    /// Observations required before stopping may be recommended.
    pub min_observations: usize,
    /// Stop once the ± margin on the display scale falls below this.
    pub max_margin: f64,
    /// Standard errors in the stopping margin. Coarser than the 95% display interval.
    pub z_score: f64,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            min_observations: 3,
            max_margin: 10.0,
            z_score: 1.0,
        }
    }
}
