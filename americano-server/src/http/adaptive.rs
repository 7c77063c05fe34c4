//! Adaptive assessment handlers
//!
//! Thin wrappers over [`AdaptiveEngine`](americano_adaptive::AdaptiveEngine).
//! Too little data is not an error: the status carries a "need at least N
//! responses" message with a 200.

use std::sync::Arc;

use americano_adaptive::{
    AbilityStatus, MasteryStatus, NextQuestion, Question, QuestionId, SessionId,
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// Body for POST /adaptive/next-question
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NextQuestionRequest {
    /// Omit to start a new session
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /adaptive/next-question
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NextQuestionRequest>, JsonRejection>,
) -> Result<Json<NextQuestion>, ApiError> {
    let Json(request) = payload?;
    let session = match request.session_id {
        Some(id) if !id.trim().is_empty() => SessionId::new(id),
        _ => SessionId::generate(),
    };
    Ok(Json(state.engine.next_question(&session).await?))
}

/// Body for POST /adaptive/submit-response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponseRequest {
    pub session_id: String,
    pub question_id: String,
    pub correct: bool,
}

/// Response for POST /adaptive/submit-response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponseResponse {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub status: AbilityStatus,
}

/// POST /adaptive/submit-response
pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitResponseRequest>, JsonRejection>,
) -> Result<Json<SubmitResponseResponse>, ApiError> {
    let Json(request) = payload?;
    if request.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("session_id is required".into()));
    }
    let session = SessionId::new(request.session_id);
    let status = state
        .engine
        .submit_response(&session, &QuestionId::new(request.question_id), request.correct)
        .await?;
    Ok(Json(SubmitResponseResponse {
        session_id: session,
        status,
    }))
}

/// Query for GET /adaptive/mastery-status
#[derive(Debug, Deserialize)]
pub struct MasteryQuery {
    pub session_id: String,
}

/// GET /adaptive/mastery-status?session_id=
pub async fn mastery_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MasteryQuery>, QueryRejection>,
) -> Result<Json<MasteryStatus>, ApiError> {
    let Query(query) = query?;
    let session = SessionId::new(query.session_id);
    Ok(Json(state.engine.mastery_status(&session).await?))
}

/// Body for POST /adaptive/questions
#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuestionsRequest {
    pub questions: Vec<Question>,
}

/// Response for POST /adaptive/questions
#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuestionsResponse {
    pub added: usize,
    pub total: usize,
}

/// POST /adaptive/questions - Add questions to the bank
pub async fn add_questions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddQuestionsRequest>, JsonRejection>,
) -> Result<Json<AddQuestionsResponse>, ApiError> {
    let Json(request) = payload?;
    let bank = state.engine.question_bank();
    let added = bank.add_questions(request.questions).await?;
    let total = bank.count().await?;
    Ok(Json(AddQuestionsResponse { added, total }))
}
