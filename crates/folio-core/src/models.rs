//! Core data models for the folio sync pipeline.
//!
//! These types are shared across all folio crates: the content records the
//! pipeline reads, the vector records it writes, and the job records that
//! track each synchronization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding vector type.
pub type Vector = Vec<f32>;

// =============================================================================
// CONTENT TYPES
// =============================================================================

/// A unit of source text with stable identity.
///
/// Owned by the content-management subsystem; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    pub category: Option<String>,
    pub source_file: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// Create a record with only an id and body, updated now.
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            body: body.into(),
            category: None,
            source_file: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Text sent to the embedding generator.
    ///
    /// `"title: body"` when a non-empty title exists, otherwise the body alone.
    pub fn embedding_text(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("{}: {}", title, self.body),
            _ => self.body.clone(),
        }
    }

    /// Metadata projection stored next to the vector.
    pub fn vector_metadata(&self, excerpt_chars: usize) -> VectorMetadata {
        VectorMetadata {
            title: self.title.clone(),
            category: self.category.clone(),
            source_file: self.source_file.clone(),
            content: self.body.chars().take(excerpt_chars).collect(),
        }
    }
}

// =============================================================================
// VECTOR TYPES
// =============================================================================

/// Small projection of a content record kept alongside its vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "chunk_type")]
    pub category: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    /// Bounded-length excerpt of the body.
    #[serde(default)]
    pub content: String,
}

/// The embedded representation of a content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vector,
    pub metadata: VectorMetadata,
}

/// Input to a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorQuery {
    /// Query with a precomputed vector.
    Vector(Vector),
    /// Query with raw text; the index embeds it.
    Text(String),
}

/// A ranked query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVector {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<VectorMetadata>,
}

/// One page of index ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdPage {
    pub ids: Vec<String>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    pub next_cursor: Option<String>,
}

/// Index-level facts reported by a vector store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub vector_count: u64,
    pub dimension: usize,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Synchronization strategy a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Reset the index and re-embed every content record
    FullRegeneration,
    /// Re-embed records changed inside the look-back window
    IncrementalUpdate,
    /// Remove index entries with no matching content record
    Cleanup,
}

impl JobType {
    /// Prefix used in generated job ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            JobType::FullRegeneration => "full_regen",
            JobType::IncrementalUpdate => "incremental",
            JobType::Cleanup => "cleanup",
        }
    }

    /// Whether the job mutates the whole index.
    ///
    /// At most one whole-index job may be active at a time.
    pub fn is_whole_index(&self) -> bool {
        matches!(self, JobType::FullRegeneration | JobType::Cleanup)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullRegeneration => "full_regeneration",
            JobType::IncrementalUpdate => "incremental_update",
            JobType::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Legal moves of the `Pending -> Running -> {Completed, Failed}` machine.
    ///
    /// `Running -> Running` is allowed so progress can be recorded.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked unit of synchronization work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingJob {
    pub id: String,
    pub job_type: JobType,
    pub status: JobStatus,
    /// 0-100.
    pub progress: u8,
    pub items_processed: u64,
    pub items_failed: u64,
    pub total_items: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// Cooperative cancellation flag, observed by the runner between items.
    #[serde(default)]
    pub cancel_requested: bool,
}

impl EmbeddingJob {
    /// Create a pending job with a fresh `<prefix>_<millis>_<suffix>` id.
    pub fn new(job_type: JobType) -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!(
                "{}_{}_{}",
                job_type.id_prefix(),
                now.timestamp_millis(),
                &suffix[..8]
            ),
            job_type,
            status: JobStatus::Pending,
            progress: 0,
            items_processed: 0,
            items_failed: 0,
            total_items: 0,
            started_at: now,
            ended_at: None,
            error_message: None,
            cancel_requested: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn view(&self) -> JobView {
        JobView::from(self)
    }
}

/// Field changes applied together with a status transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub total_items: Option<u64>,
    pub items_processed: Option<u64>,
    pub items_failed: Option<u64>,
    pub progress: Option<u8>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    pub fn total_items(mut self, total: u64) -> Self {
        self.total_items = Some(total);
        self
    }

    pub fn items_processed(mut self, processed: u64) -> Self {
        self.items_processed = Some(processed);
        self
    }

    pub fn items_failed(mut self, failed: u64) -> Self {
        self.items_failed = Some(failed);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// JSON view of a job returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: u8,
    pub items_processed: u64,
    pub items_failed: u64,
    pub total_items: u64,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&EmbeddingJob> for JobView {
    fn from(job: &EmbeddingJob) -> Self {
        Self {
            id: job.id.clone(),
            job_type: job.job_type,
            status: job.status,
            progress: job.progress,
            items_processed: job.items_processed,
            items_failed: job.items_failed,
            total_items: job.total_items,
            start_time: job.started_at,
            end_time: job.ended_at,
            error: job.error_message.clone(),
        }
    }
}

// =============================================================================
// CONTROLLER REPORTS
// =============================================================================

/// Coarse health of the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    Healthy,
    Degraded,
    Error,
}

/// Index statistics reported to the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_vectors: u64,
    pub dimensions: usize,
    pub content_records: u64,
    pub categories: u64,
    pub orphaned_vectors: u64,
    pub index_status: IndexStatus,
    /// Rough storage estimate, e.g. `"4.00 MB"`.
    pub storage_estimate: String,
    pub last_updated: DateTime<Utc>,
}

impl IndexStats {
    /// Stats reported when a collaborator could not be reached.
    pub fn unavailable(dimensions: usize) -> Self {
        Self {
            total_vectors: 0,
            dimensions,
            content_records: 0,
            categories: 0,
            orphaned_vectors: 0,
            index_status: IndexStatus::Error,
            storage_estimate: storage_estimate(0, dimensions),
            last_updated: Utc::now(),
        }
    }
}

/// `vectors * dimensions * 4` bytes, in MB with two decimals.
pub fn storage_estimate(vectors: u64, dimensions: usize) -> String {
    let bytes = vectors as f64 * dimensions as f64 * 4.0;
    format!("{:.2} MB", bytes / 1024.0 / 1024.0)
}

/// Outcome of a search probe against the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProbe {
    pub success: bool,
    pub result_count: usize,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_with_title() {
        let record = ContentRecord::new("a", "Built services in Rust").with_title("Experience");
        assert_eq!(record.embedding_text(), "Experience: Built services in Rust");
    }

    #[test]
    fn test_embedding_text_without_title() {
        let record = ContentRecord::new("a", "Built services in Rust");
        assert_eq!(record.embedding_text(), "Built services in Rust");
    }

    #[test]
    fn test_embedding_text_empty_title_uses_body() {
        let record = ContentRecord::new("a", "body").with_title("");
        assert_eq!(record.embedding_text(), "body");
    }

    #[test]
    fn test_vector_metadata_truncates_on_char_boundary() {
        let body = "é".repeat(600);
        let record = ContentRecord::new("a", body)
            .with_category("skills")
            .with_source_file("skills.json");
        let meta = record.vector_metadata(500);
        assert_eq!(meta.content.chars().count(), 500);
        assert_eq!(meta.category.as_deref(), Some("skills"));
        assert_eq!(meta.source_file.as_deref(), Some("skills.json"));
    }

    #[test]
    fn test_vector_metadata_serializes_category_as_chunk_type() {
        let meta = ContentRecord::new("a", "x")
            .with_category("projects")
            .vector_metadata(10);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["chunk_type"], "projects");
    }

    #[test]
    fn test_job_type_prefixes() {
        assert_eq!(JobType::FullRegeneration.id_prefix(), "full_regen");
        assert_eq!(JobType::IncrementalUpdate.id_prefix(), "incremental");
        assert_eq!(JobType::Cleanup.id_prefix(), "cleanup");
    }

    #[test]
    fn test_job_type_whole_index_scope() {
        assert!(JobType::FullRegeneration.is_whole_index());
        assert!(JobType::Cleanup.is_whole_index());
        assert!(!JobType::IncrementalUpdate.is_whole_index());
    }

    #[test]
    fn test_job_type_serde() {
        let json = serde_json::to_string(&JobType::IncrementalUpdate).unwrap();
        assert_eq!(json, "\"incremental_update\"");
    }

    #[test]
    fn test_job_status_transitions() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Running.can_transition_to(Pending));
        for terminal in [Completed, Failed] {
            for next in [Pending, Running, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_new_job_id_format() {
        let job = EmbeddingJob::new(JobType::FullRegeneration);
        assert!(job.id.starts_with("full_regen_"));
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(job.ended_at.is_none());

        let tail: Vec<&str> = job.id["full_regen_".len()..].split('_').collect();
        assert_eq!(tail.len(), 2);
        assert!(tail[0].parse::<i64>().is_ok());
        assert_eq!(tail[1].len(), 8);
    }

    #[test]
    fn test_new_job_ids_unique() {
        let a = EmbeddingJob::new(JobType::Cleanup);
        let b = EmbeddingJob::new(JobType::Cleanup);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_job_view_json_shape() {
        let mut job = EmbeddingJob::new(JobType::Cleanup);
        job.status = JobStatus::Failed;
        job.error_message = Some("Cancelled by user".to_string());

        let json = serde_json::to_value(job.view()).unwrap();
        assert_eq!(json["type"], "cleanup");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["itemsProcessed"], 0);
        assert_eq!(json["totalItems"], 0);
        assert_eq!(json["error"], "Cancelled by user");
        assert!(json.get("startTime").is_some());
        assert!(json.get("endTime").is_none());
    }

    #[test]
    fn test_storage_estimate() {
        assert_eq!(storage_estimate(0, 1024), "0.00 MB");
        assert_eq!(storage_estimate(1024, 1024), "4.00 MB");
    }

    #[test]
    fn test_index_stats_unavailable() {
        let stats = IndexStats::unavailable(1024);
        assert_eq!(stats.index_status, IndexStatus::Error);
        assert_eq!(stats.total_vectors, 0);
        assert_eq!(stats.dimensions, 1024);
    }
}
