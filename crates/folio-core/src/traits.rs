//! Core traits for the folio sync pipeline.
//!
//! These traits define the collaborators the job runner talks to, so the
//! content table, the vector index, the embedding service, and the job store
//! can each be swapped without touching the pipeline.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONTENT STORE
// =============================================================================

/// Read-only view over the primary content table.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every content record.
    async fn all(&self) -> Result<Vec<ContentRecord>>;

    /// Records whose `updated_at` is at or after `since`.
    async fn changed_since(&self, since: DateTime<Utc>) -> Result<Vec<ContentRecord>>;

    /// Ids of every record currently present.
    async fn valid_ids(&self) -> Result<HashSet<String>>;

    /// Distinct non-empty categories.
    async fn categories(&self) -> Result<HashSet<String>>;
}

// =============================================================================
// VECTOR STORE
// =============================================================================

/// Client for an external vector index.
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    /// Insert or replace a vector by id.
    async fn upsert(&self, record: VectorRecord) -> Result<()>;

    /// Delete a vector by id. Deleting a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Remove every vector from the index.
    async fn reset(&self) -> Result<()>;

    /// Rank stored vectors against the query, best first.
    async fn query(&self, query: VectorQuery, top_k: usize) -> Result<Vec<ScoredVector>>;

    /// One page of ids, starting after `cursor` (`None` = first page).
    async fn list_ids(&self, cursor: Option<&str>, limit: usize) -> Result<IdPage>;

    /// Vector count and dimension of the index.
    async fn info(&self) -> Result<IndexInfo>;

    /// Walk every page of [`VectorStoreClient::list_ids`].
    ///
    /// Stops if the store hands back the cursor it was given.
    async fn list_all_ids(&self, page_size: usize) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list_ids(cursor.as_deref(), page_size.max(1)).await?;
            ids.extend(page.ids);
            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(ids)
    }
}

// =============================================================================
// EMBEDDING GENERATOR
// =============================================================================

/// Capability turning text into a fixed-dimension vector.
///
/// Implementations must be deterministic for the same input and must not fail
/// for well-formed non-empty text.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Dimension of every vector this generator returns.
    fn dimension(&self) -> usize;

    /// Model name, for logs and stats.
    fn model_name(&self) -> &str;
}

// =============================================================================
// JOB STORE
// =============================================================================

/// Storage for job records.
///
/// The registry serializes all writes, so implementations only need to be
/// safe for concurrent readers alongside one writer.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job.
    async fn insert(&self, job: EmbeddingJob) -> Result<()>;

    /// Fetch a job by id.
    async fn get(&self, id: &str) -> Result<Option<EmbeddingJob>>;

    /// All jobs, in no particular order.
    async fn list(&self) -> Result<Vec<EmbeddingJob>>;

    /// Replace a stored job with the same id.
    async fn update(&self, job: EmbeddingJob) -> Result<()>;

    /// Remove a job. Returns whether it existed.
    async fn remove(&self, id: &str) -> Result<bool>;
}
