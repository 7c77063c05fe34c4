//! americano-server - HTTP API for adaptive assessment and concept extraction
//!
//! Owns the adaptive engine, the batch extractor and the circuit registry,
//! and exposes them over a small JSON API:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /adaptive/next-question` | next question, estimate and stop recommendation |
//! | `POST /adaptive/submit-response` | record a response, recompute the estimate |
//! | `GET /adaptive/mastery-status` | mastery summary for a session |
//! | `POST /adaptive/questions` | add questions to the bank |
//! | `POST /api/extraction/batch` | extract concepts from lecture chunks |
//! | `GET /api/extraction/stats` | totals across batches |
//! | `GET /api/circuits` | circuit breaker states |
//! | `GET /api/health` | liveness |

mod error;
pub mod http;
mod state;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub use error::{ApiError, ErrorResponse, ServerError};
pub use http::create_router;
pub use state::AppState;

/// The americano HTTP server
pub struct AmericanoServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl AmericanoServer {
    /// Create a server with the given state
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server until the shutdown token is cancelled
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("americano server listening on {}", addr);

        let shutdown = self.state.shutdown.clone();
        let router = create_router(self.state);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        tracing::info!("americano server stopped");
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7433,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:7433")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
