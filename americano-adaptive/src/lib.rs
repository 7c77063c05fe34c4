//! americano-adaptive - Adaptive assessment
//!
//! Estimates learner ability from graded responses with a 1-parameter
//! logistic (Rasch) model and recommends when to stop asking questions.
//!
//! - [`scale`] converts between 0-100 difficulty and logits
//! - [`AbilityEstimator`] runs Newton-Raphson maximum likelihood
//! - [`StoppingRule`] decides when the estimate is precise enough
//! - [`AdaptiveEngine`] ties these to response and question storage

pub mod config;
pub mod efficiency;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod repository;
pub mod scale;
pub mod stopping;
pub mod types;

pub use config::{AdaptiveConfig, EstimatorConfig, StoppingConfig};
pub use efficiency::EfficiencyMetrics;
pub use engine::{AbilityStatus, AdaptiveEngine, MasteryStatus, NextQuestion};
pub use error::{AdaptiveError, Result};
pub use estimator::{AbilityEstimate, AbilityEstimator, probability_correct};
pub use repository::{InMemoryQuestionBank, InMemoryResponseStore, QuestionBank, ResponseRepository};
pub use stopping::StoppingRule;
pub use types::{AbilityObservation, Question, QuestionId, ResponseRecord, SessionId};
