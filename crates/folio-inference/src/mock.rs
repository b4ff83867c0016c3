//! Mock embedding generator for tests.
//!
//! Produces the same vectors as [`HashEmbedder`] and adds failure injection,
//! artificial latency and a call log.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_inference::mock::MockEmbedder;
//!
//! let embedder = MockEmbedder::new()
//!     .with_dimension(8)
//!     .with_failure_on("broken");
//! assert!(embedder.embed("broken record").await.is_err());
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use folio_core::{EmbeddingGenerator, Error, Result, Vector};

use crate::hash::HashEmbedder;

#[derive(Debug, Clone, Default)]
struct MockConfig {
    fail_on: Vec<String>,
    latency_ms: u64,
}

/// Configurable [`EmbeddingGenerator`] for tests. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    inner: HashEmbedder,
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashEmbedder::default(),
            config: Arc::new(MockConfig::default()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.inner = HashEmbedder::new(dimension);
        self
    }

    /// Fail every text containing `needle`.
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).fail_on.push(needle.into());
        self
    }

    /// Sleep before every embedding.
    pub fn with_latency_ms(mut self, ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = ms;
        self
    }

    /// Texts passed to `embed`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn embed_call_count(&self) -> usize {
        self.calls().len()
    }

    fn record(&self, text: &str) {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(text.to_string()),
            Err(e) => e.into_inner().push(text.to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingGenerator for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        self.record(text);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(needle) = self.config.fail_on.iter().find(|n| text.contains(n.as_str())) {
            return Err(Error::Embedding(format!(
                "mock failure for text containing '{}'",
                needle
            )));
        }

        self.inner.embed_sync(text)
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_matches_hash_embedder() {
        let mock = MockEmbedder::new().with_dimension(16);
        let hash = HashEmbedder::new(16);
        assert_eq!(
            mock.embed("same text").await.unwrap(),
            hash.embed("same text").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let mock = MockEmbedder::new()
            .with_dimension(4)
            .with_failure_on("poison");
        assert!(mock.embed("fine").await.is_ok());
        assert!(matches!(
            mock.embed("a poison pill").await,
            Err(Error::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_records_calls_across_clones() {
        let mock = MockEmbedder::new().with_dimension(4);
        let clone = mock.clone();
        clone.embed("one").await.unwrap();
        mock.embed("two").await.unwrap();
        assert_eq!(mock.calls(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(clone.embed_call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let mock = MockEmbedder::new().with_dimension(4).with_latency_ms(500);
        let start = tokio::time::Instant::now();
        mock.embed("slow").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
