//! Maximum-likelihood ability estimation for the 1-parameter logistic model.
//!
//! The probability that a learner of ability θ answers an item of difficulty β
//! correctly is `1 / (1 + exp(-(θ - β)))`, both on the logit scale. θ is found
//! by Newton-Raphson on the log-likelihood, starting from the midpoint of the
//! observed difficulty range.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EstimatorConfig;
use crate::scale;
use crate::types::AbilityObservation;

/// Information below this is treated as zero.
const MIN_INFORMATION: f64 = 1e-9;

/// Standard error reported when the information is too small to invert (logits).
pub const MAX_STANDARD_ERROR: f64 = 10.0;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Result of one estimation run. All fields are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    /// Ability on the logit scale, within the configured bound.
    pub theta: f64,
    /// `1 / sqrt(I(theta))`, capped at [`MAX_STANDARD_ERROR`].
    pub standard_error: f64,
    /// Half-width of the 95% interval, logits.
    pub confidence_interval: f64,
    /// Newton steps taken.
    pub iterations: u32,
    /// Tolerance was met without clamping or zero information.
    pub converged: bool,
    /// Theta hit the bound.
    pub clamped: bool,
    /// Observations the estimate is based on.
    pub observation_count: usize,
}

impl AbilityEstimate {
    /// Ability on the 0-100 display scale.
    pub fn display_theta(&self) -> f64 {
        scale::to_display(self.theta)
    }

    /// Half-width of the 95% interval in display points.
    pub fn display_confidence_interval(&self) -> f64 {
        scale::logit_span_to_display(self.confidence_interval)
    }

    /// `z * SE` in display points.
    pub fn display_margin(&self, z_score: f64) -> f64 {
        scale::logit_span_to_display(z_score * self.standard_error)
    }
}

/// Probability of a correct response.
pub fn probability_correct(theta: f64, difficulty_logit: f64) -> f64 {
    1.0 / (1.0 + (-(theta - difficulty_logit)).exp())
}

/// Newton-Raphson ability estimator. Stateless; safe to share across sessions.
#[derive(Debug, Clone, Default)]
pub struct AbilityEstimator {
    config: EstimatorConfig,
}

impl AbilityEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate ability from the observations.
    ///
    /// Returns `None` when there are no observations. Degenerate input
    /// (all correct, all incorrect, zero information) still produces an
    /// estimate, with `converged = false`.
    pub fn estimate(&self, observations: &[AbilityObservation]) -> Option<AbilityEstimate> {
        if observations.is_empty() {
            return None;
        }

        let bound = self.config.theta_bound.abs();
        let difficulties: Vec<f64> = observations
            .iter()
            .map(AbilityObservation::difficulty_logit)
            .collect();

        let (min, max) = difficulties
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &b| {
                (lo.min(b), hi.max(b))
            });
        let mut theta = ((min + max) / 2.0).clamp(-bound, bound);

        let mut iterations = 0;
        let mut tolerance_met = false;
        let mut degenerate = false;

        while iterations < self.config.max_iterations {
            let (gradient, information) = gradient_and_information(theta, observations, &difficulties);
            if information < MIN_INFORMATION {
                degenerate = true;
                break;
            }

            let next = (theta + gradient / information).clamp(-bound, bound);
            iterations += 1;
            let step = (next - theta).abs();
            theta = next;
            if step < self.config.tolerance {
                tolerance_met = true;
                break;
            }
        }

        let (_, information) = gradient_and_information(theta, observations, &difficulties);
        let standard_error = if information < MIN_INFORMATION {
            MAX_STANDARD_ERROR
        } else {
            (1.0 / information.sqrt()).min(MAX_STANDARD_ERROR)
        };
        let clamped = theta.abs() >= bound;
        let converged = tolerance_met && !clamped && !degenerate;

        debug!(
            theta,
            standard_error,
            iterations,
            converged,
            clamped,
            observations = observations.len(),
            "Estimated ability"
        );

        Some(AbilityEstimate {
            theta,
            standard_error,
            confidence_interval: Z_95 * standard_error,
            iterations,
            converged,
            clamped,
            observation_count: observations.len(),
        })
    }
}

fn gradient_and_information(
    theta: f64,
    observations: &[AbilityObservation],
    difficulties: &[f64],
) -> (f64, f64) {
    observations
        .iter()
        .zip(difficulties)
        .fold((0.0, 0.0), |(g, i), (obs, &beta)| {
            let p = probability_correct(theta, beta);
            let u = if obs.correct { 1.0 } else { 0.0 };
            (g + (u - p), i + p * (1.0 - p))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pairs: &[(f64, bool)]) -> Vec<AbilityObservation> {
        pairs
            .iter()
            .map(|&(d, c)| AbilityObservation::new(d, c))
            .collect()
    }

    fn estimator() -> AbilityEstimator {
        AbilityEstimator::default()
    }

    #[test]
    fn test_empty_observations_yield_none() {
        assert!(estimator().estimate(&[]).is_none());
    }

    #[test]
    fn test_probability_is_half_at_matching_difficulty() {
        assert!((probability_correct(1.5, 1.5) - 0.5).abs() < 1e-12);
        assert!(probability_correct(2.0, 0.0) > 0.5);
        assert!(probability_correct(-2.0, 0.0) < 0.5);
    }

    #[test]
    fn test_example_scenario_ordering() {
        let observations = obs(&[(30.0, true), (50.0, true), (70.0, false)]);
        let estimate = estimator().estimate(&observations).unwrap();

        assert!(estimate.converged);
        assert!(estimate.iterations <= 10);
        // Between the passed 50 and the failed 70
        assert!(estimate.theta > 0.0 && estimate.theta < 2.0);
        let display = estimate.display_theta();
        assert!((45.0..=65.0).contains(&display), "display theta {display}");
        assert!((estimate.theta - 1.109).abs() < 0.01);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let observations = obs(&[
            (40.0, true),
            (55.0, true),
            (65.0, false),
            (60.0, true),
            (70.0, false),
        ]);
        let first = estimator().estimate(&observations).unwrap();
        for _ in 0..5 {
            let again = estimator().estimate(&observations).unwrap();
            assert_eq!(again.theta.to_bits(), first.theta.to_bits());
            assert_eq!(again.iterations, first.iterations);
        }
        assert!(first.converged);
    }

    #[test]
    fn test_balanced_responses_centre_on_difficulty() {
        let estimate = estimator()
            .estimate(&obs(&[(50.0, true), (50.0, false)]))
            .unwrap();
        assert!(estimate.theta.abs() < 1e-9);
        assert!((estimate.standard_error - 2f64.sqrt()).abs() < 1e-9);
        assert!((estimate.confidence_interval - 1.96 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_all_correct_is_clamped_and_finite() {
        for n in [1, 2, 5, 20] {
            let observations: Vec<_> = (0..n)
                .map(|i| AbilityObservation::correct(30.0 + (i % 5) as f64 * 10.0))
                .collect();
            let estimate = estimator().estimate(&observations).unwrap();
            assert!(estimate.theta.is_finite());
            assert!(estimate.standard_error.is_finite());
            assert!(estimate.theta <= 4.0 && estimate.theta >= -4.0);
            assert!(estimate.clamped, "n = {n}");
            assert!(!estimate.converged);
        }
    }

    #[test]
    fn test_all_incorrect_is_clamped_low() {
        let estimate = estimator()
            .estimate(&obs(&[(40.0, false), (50.0, false), (60.0, false)]))
            .unwrap();
        assert_eq!(estimate.theta, -4.0);
        assert_eq!(estimate.display_theta(), 10.0);
        assert!(estimate.clamped);
        assert!(!estimate.converged);
    }

    #[test]
    fn test_single_observation_has_large_standard_error() {
        let estimate = estimator().estimate(&obs(&[(50.0, true)])).unwrap();
        assert!(estimate.standard_error > 2.0);
        assert!(estimate.standard_error <= MAX_STANDARD_ERROR);
        assert_eq!(estimate.observation_count, 1);
    }

    #[test]
    fn test_zero_information_leaves_theta_unchanged() {
        // With a wide bound, theta walks away from two easy items until the
        // information underflows the threshold
        let config = EstimatorConfig {
            max_iterations: 50,
            theta_bound: 60.0,
            ..EstimatorConfig::default()
        };
        let estimate = AbilityEstimator::new(config)
            .estimate(&obs(&[(0.0, true), (0.0, true)]))
            .unwrap();
        assert!(estimate.theta.is_finite());
        assert!(estimate.theta > 10.0 && estimate.theta < 60.0);
        assert!(estimate.iterations < 50);
        assert_eq!(estimate.standard_error, MAX_STANDARD_ERROR);
        assert!(!estimate.clamped);
        assert!(!estimate.converged);
    }

    #[test]
    fn test_confidence_interval_shrinks_with_data() {
        let sequence = [
            (50.0, true),
            (60.0, false),
            (45.0, true),
            (55.0, true),
            (58.0, false),
            (52.0, true),
            (62.0, false),
            (48.0, true),
        ];
        let widths: Vec<f64> = (1..=sequence.len())
            .map(|n| {
                estimator()
                    .estimate(&obs(&sequence[..n]))
                    .unwrap()
                    .confidence_interval
            })
            .collect();

        assert!(widths[4] < widths[0] * 0.75);
        assert!(widths[7] < widths[4]);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let config = EstimatorConfig {
            max_iterations: 1,
            tolerance: 1e-12,
            ..EstimatorConfig::default()
        };
        let estimate = AbilityEstimator::new(config)
            .estimate(&obs(&[(30.0, true), (50.0, true), (70.0, false)]))
            .unwrap();
        assert_eq!(estimate.iterations, 1);
        assert!(!estimate.converged);
    }

    #[test]
    fn test_display_margin_uses_z_score() {
        let estimate = estimator()
            .estimate(&obs(&[(50.0, true), (50.0, false), (50.0, true), (50.0, false)]))
            .unwrap();
        assert!((estimate.standard_error - 1.0).abs() < 1e-9);
        assert!((estimate.display_margin(1.0) - 10.0).abs() < 1e-9);
        assert!((estimate.display_confidence_interval() - 19.6).abs() < 1e-9);
    }
}
