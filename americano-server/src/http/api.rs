//! Health and circuit status handlers

use std::sync::Arc;

use americano_resilience::CircuitSnapshot;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Questions available for adaptive sessions
    pub questions: usize,
    /// Circuits currently not closed
    pub open_circuits: usize,
}

/// Health check endpoint
///
/// Reports "degraded" while any circuit is open or half-open, or when the
/// question bank cannot be read.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (questions, bank_ok) = match state.engine.question_bank().count().await {
        Ok(count) => (count, true),
        Err(e) => {
            tracing::warn!(error = %e, "Question bank unavailable");
            (0, false)
        }
    };
    let open_circuits = state
        .circuits
        .snapshots()
        .iter()
        .filter(|s| s.state != americano_resilience::CircuitState::Closed)
        .count();
    let healthy = bank_ok && open_circuits == 0;

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        questions,
        open_circuits,
    })
}

/// Response for listing circuits
#[derive(Debug, Serialize, Deserialize)]
pub struct CircuitListResponse {
    pub circuits: Vec<CircuitSnapshot>,
}

/// GET /api/circuits - State of every circuit breaker
pub async fn list_circuits(State(state): State<Arc<AppState>>) -> Json<CircuitListResponse> {
    Json(CircuitListResponse {
        circuits: state.circuits.snapshots(),
    })
}
