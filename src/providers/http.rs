//! HTTP client for a prediction-style embedding service.
//!
//! The service takes `{"instances": [prompt]}` and answers
//! `{"predictions": [[f64, ...], ...]}`, the shape used by KServe /
//! TF-Serving style model servers. Only the first prediction is used.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HOST};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::EmbeddingProvider;
use crate::{MimirError, Result, telemetry};

/// Fixed request timeout for embedding calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for an embedding service reachable over HTTP.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    http: Client,
    url: String,
    host: Option<String>,
}

impl HttpEmbeddingClient {
    /// Create a client posting to `url`.
    ///
    /// When `host` is set it replaces the `Host` header on every request,
    /// for routing through an ingress that dispatches on virtual host.
    pub fn new(url: impl Into<String>, host: Option<String>) -> Result<Self> {
        Self::with_timeout(url, host, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout (for testing with wiremock).
    pub fn with_timeout(
        url: impl Into<String>,
        host: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(|e| {
            MimirError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            http,
            url: url.into(),
            host: host.filter(|h| !h.is_empty()),
        })
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, prompt: &str) -> Result<Vec<f64>> {
        let body = serde_json::to_vec(&EmbedRequest {
            instances: [prompt],
        })
        .map_err(|e| MimirError::Encoding(e.to_string()))?;

        let mut request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(host) = &self.host {
            request = request.header(HOST, host);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "embedding service responded");
        if !status.is_success() {
            return Err(MimirError::Transport(format!(
                "embedding service returned {status}"
            )));
        }

        let bytes = response.bytes().await?;
        let parsed: EmbedResponse = serde_json::from_slice(&bytes)
            .map_err(|e| MimirError::Protocol(format!("malformed embedding response: {e}")))?;

        parsed
            .predictions
            .into_iter()
            .next()
            .filter(|values| !values.is_empty())
            .ok_or_else(|| MimirError::Protocol("no prediction in embedding response".into()))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, prompt: &str) -> Result<Vec<f64>> {
        let start = Instant::now();
        let result = self.request(prompt).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::EMBEDDING_REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::EMBEDDING_REQUEST_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        result
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct EmbedRequest<'a> {
    instances: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    predictions: Vec<Vec<f64>>,
}
