//! Adaptive session engine: question selection, response recording, mastery.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AdaptiveConfig;
use crate::efficiency::EfficiencyMetrics;
use crate::error::{AdaptiveError, Result};
use crate::estimator::{AbilityEstimate, AbilityEstimator};
use crate::repository::{QuestionBank, ResponseRepository};
use crate::scale;
use crate::stopping::StoppingRule;
use crate::types::{AbilityObservation, Question, QuestionId, ResponseRecord, SessionId};

/// Current estimate plus stopping recommendation for a set of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityStatus {
    pub observation_count: usize,
    /// `None` until the first response
    pub estimate: Option<AbilityEstimate>,
    /// Ability on the 0-100 scale
    pub display_theta: Option<f64>,
    /// 95% half-width on the 0-100 scale
    pub display_confidence_interval: Option<f64>,
    pub should_stop: bool,
    pub efficiency: EfficiencyMetrics,
    pub message: String,
}

/// Response to a next-question request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextQuestion {
    pub session_id: SessionId,
    /// `None` when stopping is recommended or the bank has nothing left
    pub question: Option<Question>,
    /// Display-scale difficulty the question was chosen for
    pub target_difficulty: f64,
    pub status: AbilityStatus,
}

/// Mastery summary for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryStatus {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub status: AbilityStatus,
    /// Stopping rule met and display ability at or above the threshold
    pub mastered: bool,
    pub mastery_threshold: f64,
}

/// Drives adaptive sessions over pluggable storage.
pub struct AdaptiveEngine {
    config: AdaptiveConfig,
    estimator: AbilityEstimator,
    stopping: StoppingRule,
    responses: Arc<dyn ResponseRepository>,
    questions: Arc<dyn QuestionBank>,
}

impl std::fmt::Debug for AdaptiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AdaptiveEngine {
    pub fn new(
        config: AdaptiveConfig,
        responses: Arc<dyn ResponseRepository>,
        questions: Arc<dyn QuestionBank>,
    ) -> Self {
        Self {
            estimator: AbilityEstimator::new(config.estimator.clone()),
            stopping: StoppingRule::new(config.stopping.clone()),
            config,
            responses,
            questions,
        }
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn question_bank(&self) -> &Arc<dyn QuestionBank> {
        &self.questions
    }

    /// Estimate, stopping recommendation and efficiency for raw observations.
    pub fn evaluate(&self, observations: &[AbilityObservation]) -> AbilityStatus {
        let estimate = self.estimator.estimate(observations);
        let should_stop = self.stopping.should_stop_early(estimate.as_ref());
        let asked = u32::try_from(observations.len()).unwrap_or(u32::MAX);
        let efficiency = EfficiencyMetrics::compute(asked, self.config.baseline_questions);

        let message = match &estimate {
            _ if observations.len() < self.config.stopping.min_observations => format!(
                "Need at least {} responses to estimate ability ({} so far)",
                self.config.stopping.min_observations,
                observations.len()
            ),
            Some(_) if should_stop => efficiency.message(),
            Some(e) => format!(
                "Current estimate {:.0} ± {:.0}, keep going",
                e.display_theta(),
                e.display_confidence_interval()
            ),
            None => "No responses yet".to_string(),
        };

        AbilityStatus {
            observation_count: observations.len(),
            display_theta: estimate.as_ref().map(AbilityEstimate::display_theta),
            display_confidence_interval: estimate
                .as_ref()
                .map(AbilityEstimate::display_confidence_interval),
            estimate,
            should_stop,
            efficiency,
            message,
        }
    }

    /// Current status of a session. Unknown sessions have no observations.
    pub async fn status(&self, session: &SessionId) -> Result<AbilityStatus> {
        let observations = self.responses.observations(session).await?;
        Ok(self.evaluate(&observations))
    }

    /// Pick the unanswered question with the most information at the current estimate.
    pub async fn next_question(&self, session: &SessionId) -> Result<NextQuestion> {
        let responses = self.responses.responses(session).await?;
        let observations: Vec<_> = responses.iter().map(|r| r.observation.clone()).collect();
        let status = self.evaluate(&observations);

        // Under 1PL, information peaks where difficulty equals ability
        let target_difficulty = status
            .estimate
            .as_ref()
            .map_or(scale::DISPLAY_CENTER, AbilityEstimate::display_theta);

        let question = if status.should_stop {
            None
        } else {
            let answered: HashSet<QuestionId> =
                responses.into_iter().map(|r| r.question_id).collect();
            self.questions
                .next_question(target_difficulty, &answered)
                .await?
        };

        debug!(
            session = %session,
            target_difficulty,
            question = question.as_ref().map(|q| q.id.as_str()),
            should_stop = status.should_stop,
            "Selected next question"
        );

        Ok(NextQuestion {
            session_id: session.clone(),
            question,
            target_difficulty,
            status,
        })
    }

    /// Record a graded response and recompute the estimate.
    pub async fn submit_response(
        &self,
        session: &SessionId,
        question_id: &QuestionId,
        correct: bool,
    ) -> Result<AbilityStatus> {
        let question = self
            .questions
            .question(question_id)
            .await?
            .ok_or_else(|| AdaptiveError::QuestionNotFound(question_id.clone()))?;

        self.responses
            .record_response(
                session,
                ResponseRecord {
                    question_id: question_id.clone(),
                    observation: AbilityObservation::new(question.difficulty, correct),
                },
            )
            .await?;

        let status = self.status(session).await?;
        info!(
            session = %session,
            question = %question_id,
            correct,
            observations = status.observation_count,
            theta = status.display_theta,
            should_stop = status.should_stop,
            "Recorded response"
        );
        Ok(status)
    }

    /// Mastery summary. Sessions without responses are not found.
    pub async fn mastery_status(&self, session: &SessionId) -> Result<MasteryStatus> {
        let observations = self.responses.observations(session).await?;
        if observations.is_empty() {
            return Err(AdaptiveError::SessionNotFound(session.clone()));
        }
        let status = self.evaluate(&observations);
        let mastered = status.should_stop
            && status
                .display_theta
                .is_some_and(|theta| theta >= self.config.mastery_threshold);

        Ok(MasteryStatus {
            session_id: session.clone(),
            status,
            mastered,
            mastery_threshold: self.config.mastery_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryQuestionBank, InMemoryResponseStore};

    fn engine() -> AdaptiveEngine {
        let bank = InMemoryQuestionBank::with_questions(
            (1..=19).map(|i| Question::new(format!("q{:02}", i), format!("Question {i}"), f64::from(i) * 5.0)),
        );
        AdaptiveEngine::new(
            AdaptiveConfig::default(),
            Arc::new(InMemoryResponseStore::new()),
            Arc::new(bank),
        )
    }

    #[test]
    fn test_evaluate_without_observations() {
        let status = engine().evaluate(&[]);
        assert_eq!(status.observation_count, 0);
        assert!(status.estimate.is_none());
        assert!(!status.should_stop);
        assert!(status.message.contains("Need at least 3 responses"));
    }

    #[test]
    fn test_evaluate_reports_insufficient_data_message() {
        let status = engine().evaluate(&[AbilityObservation::correct(50.0)]);
        assert!(status.estimate.is_some());
        assert_eq!(status.message, "Need at least 3 responses to estimate ability (1 so far)");
    }

    #[tokio::test]
    async fn test_first_question_targets_center() {
        let engine = engine();
        let next = engine.next_question(&SessionId::new("s1")).await.unwrap();
        assert_eq!(next.target_difficulty, 50.0);
        assert_eq!(next.question.unwrap().id.as_str(), "q10");
    }

    #[tokio::test]
    async fn test_answered_questions_are_not_repeated() {
        let engine = engine();
        let session = SessionId::new("s1");
        engine
            .submit_response(&session, &QuestionId::new("q10"), true)
            .await
            .unwrap();
        engine
            .submit_response(&session, &QuestionId::new("q11"), false)
            .await
            .unwrap();

        let next = engine.next_question(&session).await.unwrap();
        let question = next.question.unwrap();
        assert_ne!(question.id.as_str(), "q10");
        assert_ne!(question.id.as_str(), "q11");
    }

    #[tokio::test]
    async fn test_submit_unknown_question() {
        let err = engine()
            .submit_response(&SessionId::new("s1"), &QuestionId::new("nope"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::QuestionNotFound(_)));
    }

    #[tokio::test]
    async fn test_mastery_status_unknown_session() {
        let err = engine()
            .mastery_status(&SessionId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_mastery_requires_stop_and_threshold() {
        let engine = engine();
        let session = SessionId::new("s1");
        for (id, correct) in [("q08", true), ("q10", true), ("q12", false)] {
            engine
                .submit_response(&session, &QuestionId::new(id), correct)
                .await
                .unwrap();
        }
        let mastery = engine.mastery_status(&session).await.unwrap();
        assert_eq!(mastery.status.observation_count, 3);
        assert!(!mastery.mastered);
        assert_eq!(mastery.mastery_threshold, 80.0);
    }

    #[tokio::test]
    async fn test_stop_recommendation_withholds_question() {
        let engine = engine();
        let session = SessionId::new("s1");
        // Balanced responses around 50 narrow the margin below 10 points
        for (id, correct) in [
            ("q09", true),
            ("q10", true),
            ("q11", false),
            ("q08", true),
            ("q12", false),
            ("q07", true),
        ] {
            engine
                .submit_response(&session, &QuestionId::new(id), correct)
                .await
                .unwrap();
        }
        let next = engine.next_question(&session).await.unwrap();
        assert!(next.status.should_stop);
        assert!(next.question.is_none());
        assert_eq!(next.status.efficiency.questions_saved, 9);
    }
}
