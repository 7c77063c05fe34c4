//! Server error types and their HTTP mapping

use americano_adaptive::AdaptiveError;
use americano_extraction::ExtractionError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur starting or running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Content generator could not be set up
    #[error("extraction setup failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error returned from a handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Adaptive(#[from] AdaptiveError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status code and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Adaptive(e) => match e {
                AdaptiveError::QuestionNotFound(_) => (StatusCode::NOT_FOUND, "QUESTION_NOT_FOUND"),
                AdaptiveError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
                AdaptiveError::AlreadyAnswered { .. } => (StatusCode::CONFLICT, "ALREADY_ANSWERED"),
                AdaptiveError::InvalidDifficulty(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                AdaptiveError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            Self::Extraction(e) => match e {
                ExtractionError::Disabled => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
                ExtractionError::CircuitOpen(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
                }
                ExtractionError::AllChunksFailed { .. } => {
                    (StatusCode::BAD_GATEWAY, "EXTRACTION_FAILED")
                }
                ExtractionError::Client(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Extraction(ExtractionError::CircuitOpen(open)) => format!(
                "Content service temporarily unavailable, try again in {}s",
                open.retry_in.as_secs().max(1)
            ),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), code, error = %self, "Request failed");
        }

        let details = match &self {
            Self::Extraction(e) => e
                .summary()
                .and_then(|summary| serde_json::to_value(summary).ok()),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.message(),
                code: code.to_string(),
                details,
            }),
        )
            .into_response()
    }
}
