//! HTTP server module

mod adaptive;
mod api;
mod extraction;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use adaptive::{
    AddQuestionsRequest, AddQuestionsResponse, NextQuestionRequest, SubmitResponseRequest,
    SubmitResponseResponse,
};
pub use api::{CircuitListResponse, HealthResponse};
pub use extraction::{BatchRequest, BatchResponse, ChunkInput};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/circuits", get(api::list_circuits))
        .route("/api/extraction/batch", post(extraction::extract_batch))
        .route("/api/extraction/stats", get(extraction::extraction_stats))
        .route("/adaptive/next-question", post(adaptive::next_question))
        .route("/adaptive/submit-response", post(adaptive::submit_response))
        .route("/adaptive/mastery-status", get(adaptive::mastery_status))
        .route("/adaptive/questions", post(adaptive::add_questions))
        .with_state(state)
}
