//! PostgreSQL content store over the `content_chunks` table.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use folio_core::{ContentRecord, ContentStore, Error, Result};

// Rows written before `updated_at` existed fall back to their creation time.
const SELECT_COLUMNS: &str = "chunk_id, title, content, chunk_type, source_file, \
     COALESCE(updated_at, created_at, NOW()) AS updated_at";

/// PostgreSQL implementation of [`ContentStore`].
///
/// Expects the table maintained by the content editor:
///
/// ```sql
/// CREATE TABLE content_chunks (
///   chunk_id    VARCHAR(255) PRIMARY KEY,
///   title       VARCHAR(500),
///   content     TEXT NOT NULL,
///   chunk_type  VARCHAR(100),
///   source_file VARCHAR(255),
///   created_at  TIMESTAMPTZ DEFAULT NOW(),
///   updated_at  TIMESTAMPTZ DEFAULT NOW()
/// );
/// ```
#[derive(Clone)]
pub struct PgContentStore {
    pool: Pool<Postgres>,
}

impl PgContentStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Result<ContentRecord> {
        let decode = |e: sqlx::Error| Error::ContentStore(format!("Malformed content row: {}", e));
        Ok(ContentRecord {
            id: row.try_get("chunk_id").map_err(decode)?,
            title: row.try_get("title").map_err(decode)?,
            body: row.try_get("content").map_err(decode)?,
            category: row.try_get("chunk_type").map_err(decode)?,
            source_file: row.try_get("source_file").map_err(decode)?,
            updated_at: row.try_get("updated_at").map_err(decode)?,
        })
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn all(&self) -> Result<Vec<ContentRecord>> {
        let sql = format!(
            "SELECT {} FROM content_chunks ORDER BY created_at DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::ContentStore(format!("Failed to list content: {}", e)))?;

        debug!(
            subsystem = "db",
            component = "content_store",
            op = "all",
            result_count = rows.len(),
            "Loaded content records"
        );
        rows.into_iter().map(Self::parse_row).collect()
    }

    async fn changed_since(&self, since: DateTime<Utc>) -> Result<Vec<ContentRecord>> {
        let sql = format!(
            "SELECT {} FROM content_chunks WHERE updated_at >= $1 ORDER BY updated_at DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::ContentStore(format!("Failed to list changed content: {}", e)))?;

        debug!(
            subsystem = "db",
            component = "content_store",
            op = "changed_since",
            since = %since,
            result_count = rows.len(),
            "Loaded changed content records"
        );
        rows.into_iter().map(Self::parse_row).collect()
    }

    async fn valid_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT chunk_id FROM content_chunks")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::ContentStore(format!("Failed to list content ids: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("chunk_id")
                    .map_err(|e| Error::ContentStore(format!("Malformed content row: {}", e)))
            })
            .collect()
    }

    async fn categories(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT chunk_type FROM content_chunks \
             WHERE chunk_type IS NOT NULL AND chunk_type <> ''",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::ContentStore(format!("Failed to list categories: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("chunk_type")
                    .map_err(|e| Error::ContentStore(format!("Malformed content row: {}", e)))
            })
            .collect()
    }
}
