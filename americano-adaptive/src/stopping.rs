//! Early-stopping rule for adaptive sessions.

use crate::config::StoppingConfig;
use crate::estimator::AbilityEstimate;

/// Decides when an estimate is precise enough to stop asking questions.
#[derive(Debug, Clone, Default)]
pub struct StoppingRule {
    config: StoppingConfig,
}

impl StoppingRule {
    pub fn new(config: StoppingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoppingConfig {
        &self.config
    }

    /// True once at least `min_observations` responses are in and the
    /// display-scale margin is below `max_margin`.
    ///
    /// Never true below the observation minimum, whatever the margin.
    pub fn should_stop_early(&self, estimate: Option<&AbilityEstimate>) -> bool {
        let Some(estimate) = estimate else {
            return false;
        };
        if estimate.observation_count < self.config.min_observations {
            return false;
        }
        estimate.display_margin(self.config.z_score) < self.config.max_margin
    }

    /// Responses still needed before stopping can be considered.
    pub fn observations_needed(&self, observation_count: usize) -> usize {
        self.config.min_observations.saturating_sub(observation_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::AbilityEstimator;
    use crate::types::AbilityObservation;

    fn estimate(pairs: &[(f64, bool)]) -> AbilityEstimate {
        let observations: Vec<_> = pairs
            .iter()
            .map(|&(d, c)| AbilityObservation::new(d, c))
            .collect();
        AbilityEstimator::default().estimate(&observations).unwrap()
    }

    fn synthetic(observation_count: usize, standard_error: f64) -> AbilityEstimate {
        AbilityEstimate {
            theta: 0.0,
            standard_error,
            confidence_interval: 1.96 * standard_error,
            iterations: 1,
            converged: true,
            clamped: false,
            observation_count,
        }
    }

    #[test]
    fn test_no_estimate_never_stops() {
        assert!(!StoppingRule::default().should_stop_early(None));
    }

    #[test]
    fn test_two_observations_never_stop() {
        let rule = StoppingRule::default();
        // Even an absurdly precise estimate
        assert!(!rule.should_stop_early(Some(&synthetic(2, 0.0001))));
        assert!(!rule.should_stop_early(Some(&estimate(&[(50.0, true), (50.0, false)]))));
    }

    #[test]
    fn test_three_observations_with_narrow_margin_stop() {
        let rule = StoppingRule::default();
        assert!(rule.should_stop_early(Some(&synthetic(3, 0.5))));
        assert!(!rule.should_stop_early(Some(&synthetic(3, 1.5))));
    }

    #[test]
    fn test_margin_boundary_is_exclusive() {
        let rule = StoppingRule::default();
        // Four balanced items at 50 give SE exactly 1 logit = 10 display points
        let four = estimate(&[(50.0, true), (50.0, false), (50.0, true), (50.0, false)]);
        assert!(!rule.should_stop_early(Some(&four)));

        let six = estimate(&[
            (50.0, true),
            (50.0, false),
            (50.0, true),
            (50.0, false),
            (50.0, true),
            (50.0, false),
        ]);
        assert!(rule.should_stop_early(Some(&six)));
    }

    #[test]
    fn test_well_targeted_session_stops_within_five() {
        let rule = StoppingRule::default();
        let five = estimate(&[
            (40.0, true),
            (50.0, true),
            (60.0, false),
            (55.0, true),
            (58.0, false),
        ]);
        assert!(rule.should_stop_early(Some(&five)));
    }

    #[test]
    fn test_clamped_estimate_does_not_stop() {
        let rule = StoppingRule::default();
        let all_correct = estimate(&[(30.0, true), (40.0, true), (50.0, true)]);
        assert!(!rule.should_stop_early(Some(&all_correct)));
    }

    #[test]
    fn test_observations_needed() {
        let rule = StoppingRule::default();
        assert_eq!(rule.observations_needed(0), 3);
        assert_eq!(rule.observations_needed(2), 1);
        assert_eq!(rule.observations_needed(7), 0);
    }
}
