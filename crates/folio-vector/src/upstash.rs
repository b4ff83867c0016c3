//! Upstash Vector REST client.
//!
//! Every call is an authenticated JSON request against the index URL. Responses
//! wrap their payload as `{"result": ...}`; failures carry `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use folio_core::defaults;
use folio_core::{
    Error, IdPage, IndexInfo, Result, ScoredVector, VectorMetadata, VectorQuery, VectorRecord,
    VectorStoreClient,
};

/// Connection settings for an Upstash Vector index.
#[derive(Debug, Clone)]
pub struct UpstashConfig {
    /// REST URL of the index, e.g. `https://example-us1-vector.upstash.io`.
    pub url: String,
    pub token: String,
    pub timeout_seconds: u64,
}

impl UpstashConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout_seconds: defaults::VECTOR_TIMEOUT_SECS,
        }
    }

    /// Read `UPSTASH_VECTOR_REST_URL`, `UPSTASH_VECTOR_REST_TOKEN` and
    /// `VECTOR_TIMEOUT_SECS`. Returns `None` unless both URL and token are set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("UPSTASH_VECTOR_REST_URL")
            .ok()
            .filter(|v| !v.is_empty())?;
        let token = std::env::var("UPSTASH_VECTOR_REST_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())?;
        let timeout_seconds = std::env::var("VECTOR_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::VECTOR_TIMEOUT_SECS);
        Some(Self {
            url,
            token,
            timeout_seconds,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    id: &'a str,
    vector: &'a [f32],
    metadata: &'a VectorMetadata,
}

#[derive(Debug, Deserialize)]
struct QueryHit {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<VectorMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeResult {
    #[serde(default)]
    next_cursor: String,
    #[serde(default)]
    vectors: Vec<RangeVector>,
}

#[derive(Debug, Deserialize)]
struct RangeVector {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoResult {
    #[serde(default)]
    vector_count: u64,
    #[serde(default)]
    dimension: usize,
}

/// [`VectorStoreClient`] over the Upstash Vector REST API.
pub struct UpstashVectorIndex {
    client: Client,
    config: UpstashConfig,
}

impl UpstashVectorIndex {
    pub fn new(config: UpstashConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::VectorStore(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "vector",
            component = "upstash",
            url = %config.url,
            "Initializing Upstash vector client"
        );
        Ok(Self { client, config })
    }

    fn build_request(&self, method: Method, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), endpoint);
        self.client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.config.token))
    }

    /// Send a request and unwrap the `result` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let mut req = self.build_request(method, endpoint);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::VectorStore(format!("{} request failed: {}", endpoint, e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::VectorStore(format!("{} read failed: {}", endpoint, e)))?;

        let envelope: Envelope<T> = match serde_json::from_str(&text) {
            Ok(env) => env,
            Err(e) if status.is_success() => {
                return Err(Error::VectorStore(format!(
                    "{} returned malformed response: {}",
                    endpoint, e
                )))
            }
            Err(_) => Envelope {
                result: None,
                error: Some(text),
            },
        };

        if !status.is_success() || envelope.error.is_some() {
            let message = envelope.error.unwrap_or_else(|| "Unknown error".to_string());
            warn!(
                subsystem = "vector",
                component = "upstash",
                endpoint,
                status = %status,
                error = %message,
                "Vector index request failed"
            );
            return Err(Error::VectorStore(format!(
                "{} failed ({}): {}",
                endpoint, status, message
            )));
        }

        envelope
            .result
            .ok_or_else(|| Error::VectorStore(format!("{} returned no result", endpoint)))
    }
}

#[async_trait]
impl VectorStoreClient for UpstashVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        let body = serde_json::to_value(UpsertBody {
            id: &record.id,
            vector: &record.vector,
            metadata: &record.metadata,
        })?;
        let _: serde_json::Value = self.call(Method::POST, "/upsert", Some(body)).await?;
        debug!(subsystem = "vector", component = "upstash", id = %record.id, "Upserted vector");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(Method::POST, "/delete", Some(json!([id])))
            .await?;
        debug!(subsystem = "vector", component = "upstash", id, "Deleted vector");
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let _: serde_json::Value = self.call(Method::DELETE, "/reset", None).await?;
        info!(subsystem = "vector", component = "upstash", "Index reset");
        Ok(())
    }

    async fn query(&self, query: VectorQuery, top_k: usize) -> Result<Vec<ScoredVector>> {
        let (endpoint, body) = match query {
            VectorQuery::Vector(vector) => (
                "/query",
                json!({"vector": vector, "topK": top_k, "includeMetadata": true}),
            ),
            VectorQuery::Text(data) => (
                "/query-data",
                json!({"data": data, "topK": top_k, "includeMetadata": true}),
            ),
        };
        let hits: Vec<QueryHit> = self.call(Method::POST, endpoint, Some(body)).await?;
        Ok(hits
            .into_iter()
            .map(|h| ScoredVector {
                id: h.id,
                score: h.score,
                metadata: h.metadata,
            })
            .collect())
    }

    async fn list_ids(&self, cursor: Option<&str>, limit: usize) -> Result<IdPage> {
        let body = json!({
            "cursor": cursor.unwrap_or("0"),
            "limit": limit,
            "includeMetadata": false,
            "includeVectors": false,
        });
        let page: RangeResult = self.call(Method::POST, "/range", Some(body)).await?;
        let next_cursor = match page.next_cursor.as_str() {
            "" | "0" => None,
            _ => Some(page.next_cursor),
        };
        Ok(IdPage {
            ids: page.vectors.into_iter().map(|v| v.id).collect(),
            next_cursor,
        })
    }

    async fn info(&self) -> Result<IndexInfo> {
        let info: InfoResult = self.call(Method::GET, "/info", None).await?;
        Ok(IndexInfo {
            vector_count: info.vector_count,
            dimension: info.dimension,
        })
    }
}
