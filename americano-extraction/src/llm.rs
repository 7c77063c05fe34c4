//! HTTP client for the content-generation companion service.
//!
//! Sends `POST {endpoint}/generate` with a JSON body and expects
//! `{"text": "..."}` back. Status codes and transport failures are mapped to
//! [`GenerateError`] here so nothing upstream inspects raw HTTP.

use americano_resilience::parse_retry_after;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::{ExtractionError, Result};
use crate::generator::{ContentGenerator, GenerateError, GenerationContext};
use crate::types::GeneratedContent;

/// Longest error body kept in a [`GenerateError::Http`].
const MAX_ERROR_BODY: usize = 512;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    context: &'a GenerationContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(alias = "content", alias = "output")]
    text: String,
    #[serde(default)]
    model: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// HttpContentGenerator
// ────────────────────────────────────────────────────────────────────────────

/// Content generator backed by the companion HTTP service.
pub struct HttpContentGenerator {
    endpoint: String,
    model: Option<String>,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContentGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpContentGenerator {
    /// Create a generator from configuration.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExtractionError::Client(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
            client,
        })
    }

    /// Base URL of the service.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.endpoint)
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(
        &self,
        prompt: &str,
        context: &GenerationContext,
    ) -> std::result::Result<GeneratedContent, GenerateError> {
        let body = GenerateRequest {
            prompt,
            context,
            model: self.model.as_deref(),
        };

        let mut request = self.client.post(self.generate_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        trace!(url = %self.generate_url(), prompt_len = prompt.len(), "Sending generate request");
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Generate request failed");
            return Err(status_error(status, retry_after, body));
        }

        let text = response.text().await.map_err(transport_error)?;
        parse_generate_response(&text)
    }
}

/// Map a reqwest transport failure.
fn transport_error(error: reqwest::Error) -> GenerateError {
    if error.is_timeout() {
        GenerateError::Timeout
    } else if error.is_decode() {
        GenerateError::MalformedResponse(error.to_string())
    } else {
        GenerateError::Network(error.to_string())
    }
}

/// Map a non-success status.
fn status_error(
    status: StatusCode,
    retry_after: Option<std::time::Duration>,
    body: String,
) -> GenerateError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GenerateError::RateLimited { retry_after };
    }
    let mut body = body;
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    GenerateError::Http {
        status: status.as_u16(),
        body,
    }
}

fn parse_generate_response(text: &str) -> std::result::Result<GeneratedContent, GenerateError> {
    let response: GenerateResponse = serde_json::from_str(text)
        .map_err(|e| GenerateError::MalformedResponse(format!("unexpected response body: {e}")))?;
    Ok(GeneratedContent {
        text: response.text,
        model: response.model,
    })
}
