//! Batch extraction handlers

use std::sync::Arc;

use americano_extraction::{BatchSummary, ContentChunk, ExtractedConcept, ExtractionStats};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

/// One chunk in a batch request
#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkInput {
    /// Defaults to `chunk-{n}`, 1-indexed
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Body for POST /api/extraction/batch
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    pub chunks: Vec<ChunkInput>,
}

/// Response for POST /api/extraction/batch
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub summary: BatchSummary,
    /// Concepts across all chunks, merged by name
    pub concepts: Vec<ExtractedConcept>,
}

/// POST /api/extraction/batch
///
/// Partial failure is a 200 with per-chunk detail. Only a batch where no
/// chunk succeeded is an error.
pub async fn extract_batch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(request) = payload?;
    if request.chunks.is_empty() {
        return Err(ApiError::BadRequest("at least one chunk is required".into()));
    }

    let chunks = request
        .chunks
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let id = input.id.unwrap_or_else(|| format!("chunk-{}", i + 1));
            let chunk = ContentChunk::new(id, input.text);
            match input.source {
                Some(source) => chunk.with_source(source),
                None => chunk,
            }
        })
        .collect();

    // Dropping this future on client disconnect drops the calls with it
    let cancel = state.shutdown.child_token();
    let summary = state.extractor.extract(chunks, &cancel).await?;
    let concepts = summary.unique_concepts();
    Ok(Json(BatchResponse { summary, concepts }))
}

/// GET /api/extraction/stats
pub async fn extraction_stats(State(state): State<Arc<AppState>>) -> Json<ExtractionStats> {
    Json(state.extractor.stats())
}
