//! Content-generation service abstraction.

use std::time::Duration;

use americano_resilience::{Classify, FailureKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChunkId, GeneratedContent};

/// Extra context sent alongside a prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<ChunkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Failure from the content-generation service, classified at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// HTTP 429, optionally with a `retry-after`
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Connection refused, reset, DNS failure
    #[error("network error: {0}")]
    Network(String),

    /// The request did not finish in time
    #[error("request timed out")]
    Timeout,

    /// The service answered with something we cannot parse
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl Classify for GenerateError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { retry_after } => FailureKind::RateLimited {
                retry_after: *retry_after,
            },
            Self::Network(_) | Self::Timeout => FailureKind::Transient,
            Self::MalformedResponse(_) => FailureKind::Permanent,
            Self::Http { status, .. } => FailureKind::from_status(*status, None),
        }
    }
}

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Generate content for a prompt
    async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
    ) -> Result<GeneratedContent, GenerateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_generator_is_object_safe() {
        fn _takes_boxed(_: Box<dyn ContentGenerator>) {}
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            GenerateError::RateLimited {
                retry_after: Some(Duration::from_secs(2))
            }
            .failure_kind()
            .retry_after(),
            Some(Duration::from_secs(2))
        );
        assert_eq!(GenerateError::Timeout.failure_kind(), FailureKind::Transient);
        assert_eq!(
            GenerateError::Network("reset".into()).failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            GenerateError::MalformedResponse("not json".into()).failure_kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            GenerateError::Http { status: 400, body: String::new() }.failure_kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            GenerateError::Http { status: 503, body: String::new() }.failure_kind(),
            FailureKind::Transient
        );
        assert!(GenerateError::Http { status: 302, body: String::new() }
            .failure_kind()
            .is_retriable());
    }

    #[test]
    fn test_error_display() {
        let err = GenerateError::Http {
            status: 418,
            body: "teapot".into(),
        };
        assert_eq!(err.to_string(), "HTTP 418: teapot");
    }
}
