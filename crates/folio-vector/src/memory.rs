//! In-memory vector index.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use folio_core::{
    EmbeddingGenerator, Error, IdPage, IndexInfo, Result, ScoredVector, Vector, VectorQuery,
    VectorRecord, VectorStoreClient,
};

/// Cosine similarity of two equal-length vectors; 0.0 if either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a > 0.0 && mag_b > 0.0 {
        dot / (mag_a * mag_b)
    } else {
        0.0
    }
}

/// [`VectorStoreClient`] held in an ordered map. Clones share the same index.
///
/// Ids are listed in lexical order and the cursor is the last id of the
/// previous page. Text queries need an embedder, see
/// [`MemoryVectorIndex::with_embedder`].
#[derive(Clone)]
pub struct MemoryVectorIndex {
    dimension: usize,
    entries: Arc<RwLock<BTreeMap<String, VectorRecord>>>,
    embedder: Option<Arc<dyn EmbeddingGenerator>>,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            embedder: None,
        }
    }

    /// Embed text queries with `embedder`.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingGenerator>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn get(&self, id: &str) -> Option<VectorRecord> {
        self.entries.read().await.get(id).cloned()
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::VectorStore(format!(
                "Dimension mismatch: index has {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }

    async fn resolve_query(&self, query: VectorQuery) -> Result<Vector> {
        match query {
            VectorQuery::Vector(v) => Ok(v),
            VectorQuery::Text(text) => match self.embedder {
                Some(ref embedder) => embedder.embed(&text).await,
                None => Err(Error::VectorStore(
                    "Text queries need an embedder on this index".to_string(),
                )),
            },
        }
    }
}

#[async_trait]
impl VectorStoreClient for MemoryVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        self.check_dimension(&record.vector)?;
        self.entries.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.entries.write().await.remove(id);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        debug!(subsystem = "vector", component = "memory", removed, "Index reset");
        Ok(())
    }

    async fn query(&self, query: VectorQuery, top_k: usize) -> Result<Vec<ScoredVector>> {
        let vector = self.resolve_query(query).await?;
        self.check_dimension(&vector)?;

        let entries = self.entries.read().await;
        let mut hits: Vec<ScoredVector> = entries
            .values()
            .map(|r| ScoredVector {
                id: r.id.clone(),
                score: cosine_similarity(&vector, &r.vector),
                metadata: Some(r.metadata.clone()),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn list_ids(&self, cursor: Option<&str>, limit: usize) -> Result<IdPage> {
        let entries = self.entries.read().await;
        let lower = match cursor {
            Some(c) if !c.is_empty() => Bound::Excluded(c.to_string()),
            _ => Bound::Unbounded,
        };

        let mut range = entries.range::<String, _>((lower, Bound::Unbounded));
        let ids: Vec<String> = range.by_ref().take(limit).map(|(id, _)| id.clone()).collect();
        let next_cursor = match (range.next(), ids.last()) {
            (Some(_), Some(last)) => Some(last.clone()),
            _ => None,
        };
        Ok(IdPage { ids, next_cursor })
    }

    async fn info(&self) -> Result<IndexInfo> {
        Ok(IndexInfo {
            vector_count: self.entries.read().await.len() as u64,
            dimension: self.dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::VectorMetadata;

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            vector,
            metadata: VectorMetadata::default(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = MemoryVectorIndex::new(2);
        index.upsert(record("a", vec![1.0, 0.0])).await.unwrap();
        index.upsert(record("a", vec![0.0, 1.0])).await.unwrap();
        assert_eq!(index.len().await, 1);
        assert_eq!(index.get("a").await.unwrap().vector, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension() {
        let index = MemoryVectorIndex::new(3);
        let err = index.upsert(record("a", vec![1.0])).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let index = MemoryVectorIndex::new(2);
        index.delete("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_query_ranks_by_cosine() {
        let index = MemoryVectorIndex::new(2);
        index.upsert(record("east", vec![1.0, 0.0])).await.unwrap();
        index.upsert(record("north", vec![0.0, 1.0])).await.unwrap();
        index.upsert(record("northeast", vec![0.7, 0.7])).await.unwrap();

        let hits = index
            .query(VectorQuery::Vector(vec![1.0, 0.1]), 2)
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["east", "northeast"]);
    }

    #[tokio::test]
    async fn test_text_query_without_embedder_fails() {
        let index = MemoryVectorIndex::new(2);
        let result = index.query(VectorQuery::Text("rust".to_string()), 5).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_text_query_with_embedder() {
        let embedder = Arc::new(folio_inference::HashEmbedder::new(8));
        let index = MemoryVectorIndex::new(8).with_embedder(embedder.clone());
        let v = embedder.embed_sync("software engineer").unwrap();
        index.upsert(record("match", v)).await.unwrap();

        let hits = index
            .query(VectorQuery::Text("software engineer".to_string()), 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_list_ids_pages_with_cursor() {
        let index = MemoryVectorIndex::new(1);
        for id in ["a", "b", "c", "d", "e"] {
            index.upsert(record(id, vec![1.0])).await.unwrap();
        }

        let first = index.list_ids(None, 2).await.unwrap();
        assert_eq!(first.ids, vec!["a", "b"]);
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let last = index.list_ids(Some("d"), 2).await.unwrap();
        assert_eq!(last.ids, vec!["e"]);
        assert!(last.next_cursor.is_none());

        let all = index.list_all_ids(2).await.unwrap();
        assert_eq!(all, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_reset_and_info() {
        let index = MemoryVectorIndex::new(4);
        index.upsert(record("a", vec![1.0; 4])).await.unwrap();
        assert_eq!(index.info().await.unwrap().vector_count, 1);

        index.reset().await.unwrap();
        let info = index.info().await.unwrap();
        assert_eq!(info.vector_count, 0);
        assert_eq!(info.dimension, 4);
    }
}
