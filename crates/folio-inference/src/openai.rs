//! OpenAI-compatible embedding generator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use folio_core::defaults;
use folio_core::{EmbeddingGenerator, Error, Result, Vector};

/// Configuration for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token (optional for local endpoints).
    pub api_key: Option<String>,
    pub model: String,
    /// Dimension every returned vector must have.
    pub dimension: usize,
    /// Ask the server to shorten vectors to `dimension`.
    pub request_dimensions: bool,
    pub timeout_seconds: u64,
}

impl Default for OpenAIEmbedConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            api_key: None,
            model: defaults::OPENAI_EMBED_MODEL.to_string(),
            dimension: defaults::EMBED_DIMENSION,
            request_dimensions: true,
            timeout_seconds: defaults::EMBED_TIMEOUT_SECS,
        }
    }
}

impl OpenAIEmbedConfig {
    /// Read `OPENAI_BASE_URL`, `OPENAI_API_KEY`, `OPENAI_EMBED_MODEL`,
    /// `EMBED_DIMENSION`, `OPENAI_REQUEST_DIMENSIONS` and `EMBED_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(d.base_url),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            model: std::env::var("OPENAI_EMBED_MODEL").unwrap_or(d.model),
            dimension: std::env::var("EMBED_DIMENSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.dimension),
            request_dimensions: std::env::var("OPENAI_REQUEST_DIMENSIONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(d.request_dimensions),
            timeout_seconds: std::env::var("EMBED_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.timeout_seconds),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`EmbeddingGenerator`] backed by an OpenAI-compatible HTTP API.
pub struct OpenAIEmbedder {
    client: Client,
    config: OpenAIEmbedConfig,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIEmbedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.model,
            dimension = config.dimension,
            "Initializing OpenAI embedder"
        );

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIEmbedConfig::from_env())
    }

    pub fn config(&self) -> &OpenAIEmbedConfig {
        &self.config
    }

    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: text,
            encoding_format: "float",
            dimensions: self
                .config
                .request_dimensions
                .then_some(self.config.dimension),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => "Unknown error".to_string(),
            };
            warn!(
                subsystem = "inference",
                component = "openai",
                status = %status,
                error = %message,
                "Embedding request rejected"
            );
            return Err(Error::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, message
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        body.data.sort_by_key(|d| d.index);
        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("Response contained no embeddings".to_string()))?;

        if vector.len() != self.config.dimension {
            return Err(Error::Embedding(format!(
                "Expected dimension {}, got {}",
                self.config.dimension,
                vector.len()
            )));
        }

        debug!(
            subsystem = "inference",
            component = "openai",
            model = %self.config.model,
            dimension = vector.len(),
            "Generated embedding"
        );
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder_for(server: &MockServer, dimension: usize) -> OpenAIEmbedder {
        OpenAIEmbedder::new(
            OpenAIEmbedConfig::default()
                .with_base_url(server.uri())
                .with_api_key("sk-test")
                .with_dimension(dimension),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_sends_bearer_and_parses_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": "Experience: Rust",
                "dimensions": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = embedder_for(&server, 3);
        let v = embedder.embed("Experience: Rust").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_rejects_wrong_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2], "index": 0}]
            })))
            .mount(&server)
            .await;

        let embedder = embedder_for(&server, 3);
        let err = embedder.embed("text").await.unwrap_err();
        assert!(err.to_string().contains("Expected dimension 3, got 2"));
    }

    #[tokio::test]
    async fn test_embed_surfaces_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limit exceeded", "type": "rate_limit"}
            })))
            .mount(&server)
            .await;

        let embedder = embedder_for(&server, 3);
        match embedder.embed("text").await {
            Err(Error::Embedding(msg)) => assert!(msg.contains("Rate limit exceeded")),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let embedder = embedder_for(&server, 3);
        assert!(embedder.embed("").await.is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenAIEmbedConfig::default();
        assert_eq!(config.model, "text-embedding-3-small");
        assert_eq!(config.dimension, 1024);
        assert!(config.api_key.is_none());
    }
}
