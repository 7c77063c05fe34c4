//! Storage traits for responses and questions, with in-memory implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AdaptiveError, Result};
use crate::types::{AbilityObservation, Question, QuestionId, ResponseRecord, SessionId};

/// Per-session response history
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Append a response to a session
    async fn record_response(&self, session: &SessionId, record: ResponseRecord) -> Result<()>;

    /// All responses for a session, oldest first. Empty for unknown sessions.
    async fn responses(&self, session: &SessionId) -> Result<Vec<ResponseRecord>>;

    /// Observations for a session, oldest first
    async fn observations(&self, session: &SessionId) -> Result<Vec<AbilityObservation>> {
        Ok(self
            .responses(session)
            .await?
            .into_iter()
            .map(|r| r.observation)
            .collect())
    }
}

/// Question lookup by difficulty
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Question closest to `target_difficulty` (0-100) not in `exclude`
    async fn next_question(
        &self,
        target_difficulty: f64,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Option<Question>>;

    /// Look up a question by ID
    async fn question(&self, id: &QuestionId) -> Result<Option<Question>>;

    /// Add questions to the bank, replacing any with the same ID.
    /// Returns how many IDs were new.
    async fn add_questions(&self, questions: Vec<Question>) -> Result<usize>;

    /// Number of questions in the bank
    async fn count(&self) -> Result<usize>;
}

/// In-memory response store
#[derive(Debug, Default)]
pub struct InMemoryResponseStore {
    sessions: RwLock<HashMap<SessionId, Vec<ResponseRecord>>>,
}

impl InMemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with at least one response
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl ResponseRepository for InMemoryResponseStore {
    async fn record_response(&self, session: &SessionId, record: ResponseRecord) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session.clone()).or_default();
        if history.iter().any(|r| r.question_id == record.question_id) {
            return Err(AdaptiveError::AlreadyAnswered {
                session: session.clone(),
                question: record.question_id,
            });
        }
        history.push(record);
        Ok(())
    }

    async fn responses(&self, session: &SessionId) -> Result<Vec<ResponseRecord>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory question bank
#[derive(Debug, Default)]
pub struct InMemoryQuestionBank {
    questions: RwLock<HashMap<QuestionId, Question>>,
}

impl InMemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank pre-filled with questions
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let map = questions.into_iter().map(|q| (q.id.clone(), q)).collect();
        Self {
            questions: RwLock::new(map),
        }
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn next_question(
        &self,
        target_difficulty: f64,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Option<Question>> {
        let questions = self.questions.read().await;
        // Ties go to the lower ID so selection is deterministic
        let best = questions
            .values()
            .filter(|q| !exclude.contains(&q.id))
            .min_by(|a, b| {
                let da = (a.difficulty - target_difficulty).abs();
                let db = (b.difficulty - target_difficulty).abs();
                da.total_cmp(&db).then_with(|| a.id.cmp(&b.id))
            })
            .cloned();
        Ok(best)
    }

    async fn question(&self, id: &QuestionId) -> Result<Option<Question>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn add_questions(&self, questions: Vec<Question>) -> Result<usize> {
        if let Some(bad) = questions
            .iter()
            .find(|q| !q.difficulty.is_finite() || !(0.0..=100.0).contains(&q.difficulty))
        {
            return Err(AdaptiveError::InvalidDifficulty(bad.difficulty));
        }
        let mut map = self.questions.write().await;
        let mut added = 0;
        for q in questions {
            if map.insert(q.id.clone(), q).is_none() {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.questions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> InMemoryQuestionBank {
        InMemoryQuestionBank::with_questions([
            Question::new("q30", "easy", 30.0),
            Question::new("q50", "medium", 50.0),
            Question::new("q70", "hard", 70.0),
        ])
    }

    // Verify traits are object-safe
    #[test]
    fn test_response_repository_is_object_safe() {
        fn _takes_boxed(_: Box<dyn ResponseRepository>) {}
    }

    #[test]
    fn test_question_bank_is_object_safe() {
        fn _takes_boxed(_: Box<dyn QuestionBank>) {}
    }

    #[tokio::test]
    async fn test_next_question_picks_closest_difficulty() {
        let bank = bank();
        let q = bank.next_question(62.0, &HashSet::new()).await.unwrap().unwrap();
        assert_eq!(q.id.as_str(), "q70");

        let q = bank.next_question(41.0, &HashSet::new()).await.unwrap().unwrap();
        assert_eq!(q.id.as_str(), "q50");
    }

    #[tokio::test]
    async fn test_next_question_honours_exclusions() {
        let bank = bank();
        let exclude: HashSet<_> = [QuestionId::new("q50")].into_iter().collect();
        let q = bank.next_question(50.0, &exclude).await.unwrap().unwrap();
        // 30 and 70 are equally far; lower ID wins
        assert_eq!(q.id.as_str(), "q30");
    }

    #[tokio::test]
    async fn test_next_question_exhausted_bank() {
        let bank = bank();
        let exclude: HashSet<_> = ["q30", "q50", "q70"].into_iter().map(QuestionId::from).collect();
        assert!(bank.next_question(50.0, &exclude).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_questions_counts_only_new_ids() {
        let bank = InMemoryQuestionBank::new();
        let added = bank
            .add_questions(vec![Question::new("q1", "?", 40.0), Question::new("q2", "?", 60.0)])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let added = bank
            .add_questions(vec![Question::new("q2", "revised", 65.0), Question::new("q3", "?", 70.0)])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(bank.count().await.unwrap(), 3);

        let replaced = bank.question(&QuestionId::new("q2")).await.unwrap().unwrap();
        assert_eq!(replaced.prompt, "revised");
    }

    #[tokio::test]
    async fn test_add_questions_rejects_bad_difficulty() {
        let bank = InMemoryQuestionBank::new();
        let err = bank
            .add_questions(vec![Question::new("bad", "?", 140.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidDifficulty(_)));
        assert_eq!(bank.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_and_read_responses() {
        let store = InMemoryResponseStore::new();
        let session = SessionId::new("s1");
        store
            .record_response(
                &session,
                ResponseRecord {
                    question_id: QuestionId::new("q1"),
                    observation: AbilityObservation::correct(40.0),
                },
            )
            .await
            .unwrap();

        let observations = store.observations(&session).await.unwrap();
        assert_eq!(observations.len(), 1);
        assert!(observations[0].correct);
        assert!(store.responses(&SessionId::new("other")).await.unwrap().is_empty());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_answer_rejected() {
        let store = InMemoryResponseStore::new();
        let session = SessionId::new("s1");
        let record = ResponseRecord {
            question_id: QuestionId::new("q1"),
            observation: AbilityObservation::correct(40.0),
        };
        store.record_response(&session, record.clone()).await.unwrap();
        let err = store.record_response(&session, record).await.unwrap_err();
        assert!(matches!(err, AdaptiveError::AlreadyAnswered { .. }));
    }
}
