//! In-memory content store.
//!
//! Used when no database is configured and as the content fixture in tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use folio_core::{ContentRecord, ContentStore, Result};

/// [`ContentStore`] backed by an ordered map. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    records: Arc<RwLock<BTreeMap<String, ContentRecord>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: Arc::new(RwLock::new(map)),
        }
    }

    /// Insert or replace a record.
    pub async fn upsert(&self, record: ContentRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    /// Remove a record. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.records.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn all(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn changed_since(&self, since: DateTime<Utc>) -> Result<Vec<ContentRecord>> {
        let mut changed: Vec<ContentRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.updated_at >= since)
            .cloned()
            .collect();
        changed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(changed)
    }

    async fn valid_ids(&self) -> Result<HashSet<String>> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn categories(&self) -> Result<HashSet<String>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter_map(|r| r.category.clone())
            .filter(|c| !c.is_empty())
            .collect())
    }
}
