//! Job runner: the three synchronization strategies.
//!
//! - Full regeneration: enumerate all content, reset the index, embed and
//!   upsert every record.
//! - Incremental update: embed and upsert records changed inside the window.
//! - Cleanup: delete index ids with no content record.
//!
//! Per-item failures are counted and skipped. Enumeration or reset failures
//! fail the job. Cancellation is checked before each item and once more
//! before the job is recorded as finished.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, instrument, trace, warn};

use folio_core::defaults;
use folio_core::{
    ContentRecord, ContentStore, EmbeddingGenerator, Error, JobType, JobUpdate, Result,
    VectorRecord, VectorStoreClient,
};

use crate::config::SyncConfig;
use crate::registry::JobRegistry;

/// Item counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub total: u64,
    pub processed: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

impl RunOutcome {
    fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn attempted(&self) -> u64 {
        self.processed + self.failed
    }

    /// `round(attempted / of * 100)`; 100 when there is nothing to do.
    fn progress(&self, of: u64) -> u8 {
        if of == 0 {
            return 100;
        }
        ((self.attempted() as f64 / of as f64) * 100.0).round().min(100.0) as u8
    }

    fn update(&self, of: u64) -> JobUpdate {
        JobUpdate::default()
            .total_items(self.total)
            .items_processed(self.processed)
            .items_failed(self.failed)
            .progress(self.progress(of))
    }

    fn record_failure(&mut self, err: &Error) {
        self.failed += 1;
        self.last_error = Some(err.to_string());
    }
}

/// Executes sync jobs against the content store and vector index.
pub struct JobRunner {
    content: Arc<dyn ContentStore>,
    vectors: Arc<dyn VectorStoreClient>,
    embedder: Arc<dyn EmbeddingGenerator>,
    registry: Arc<JobRegistry>,
    config: SyncConfig,
}

impl JobRunner {
    pub fn new(
        content: Arc<dyn ContentStore>,
        vectors: Arc<dyn VectorStoreClient>,
        embedder: Arc<dyn EmbeddingGenerator>,
        registry: Arc<JobRegistry>,
        config: SyncConfig,
    ) -> Self {
        Self {
            content,
            vectors,
            embedder,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a pending job to a terminal state.
    ///
    /// Never returns an error: every outcome is recorded on the job.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "runner"))]
    pub async fn run(&self, job_id: &str, job_type: JobType) {
        let start = Instant::now();

        if let Err(e) = self.registry.start(job_id).await {
            error!(error = %e, "Failed to start job");
            return;
        }
        info!("Job started");

        let result = match job_type {
            JobType::FullRegeneration => self.full_regeneration(job_id).await,
            JobType::IncrementalUpdate => self.incremental_update(job_id).await,
            JobType::Cleanup => self.cleanup(job_id).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let recorded = match result {
            Ok(outcome) if self.all_items_failed(&outcome) => {
                let message = format!(
                    "All {} items failed: {}",
                    outcome.failed,
                    outcome.last_error.as_deref().unwrap_or("unknown error")
                );
                error!(duration_ms, error = %message, "Job failed");
                self.registry.fail(job_id, message).await
            }
            Ok(outcome) => {
                info!(
                    duration_ms,
                    total_items = outcome.total,
                    items_processed = outcome.processed,
                    items_failed = outcome.failed,
                    "Job completed"
                );
                let update = JobUpdate::default()
                    .total_items(outcome.total)
                    .items_processed(outcome.processed)
                    .items_failed(outcome.failed);
                self.registry.complete(job_id, update).await
            }
            Err(Error::Cancelled) => {
                warn!(duration_ms, "Job cancelled");
                self.registry
                    .fail(job_id, defaults::CANCELLED_MESSAGE)
                    .await
            }
            Err(e) => {
                error!(duration_ms, error = %e, "Job failed");
                self.registry.fail(job_id, e.to_string()).await
            }
        };

        if let Err(e) = recorded {
            error!(error = %e, "Failed to record job outcome");
        }
    }

    fn all_items_failed(&self, outcome: &RunOutcome) -> bool {
        self.config.fail_when_all_items_fail
            && outcome.failed > 0
            && outcome.processed == 0
    }

    async fn full_regeneration(&self, job_id: &str) -> Result<RunOutcome> {
        let records = self.content.all().await?;
        debug!(
            job_id,
            total_items = records.len(),
            "Enumerated content for full regeneration"
        );
        self.vectors.reset().await?;
        info!(job_id, "Vector index reset");
        self.embed_all(job_id, records).await
    }

    async fn incremental_update(&self, job_id: &str) -> Result<RunOutcome> {
        let since = Utc::now() - self.config.incremental_window();
        let records = self.content.changed_since(since).await?;
        debug!(
            job_id,
            since = %since,
            total_items = records.len(),
            "Selected changed content"
        );
        self.embed_all(job_id, records).await
    }

    async fn embed_all(&self, job_id: &str, records: Vec<ContentRecord>) -> Result<RunOutcome> {
        let total = records.len() as u64;
        let mut outcome = RunOutcome::new(total);
        self.registry
            .record_progress(job_id, outcome.update(total))
            .await?;

        let delay = self.config.item_delay();
        for (i, record) in records.iter().enumerate() {
            self.check_cancelled(job_id).await?;

            match self.embed_one(record).await {
                Ok(()) => {
                    outcome.processed += 1;
                    trace!(job_id, record_id = %record.id, "Embedded record");
                }
                Err(e) => {
                    warn!(job_id, record_id = %record.id, error = %e, "Failed to embed record, skipping");
                    outcome.record_failure(&e);
                }
            }

            self.registry
                .record_progress(job_id, outcome.update(total))
                .await?;

            if !delay.is_zero() && i + 1 < records.len() {
                tokio::time::sleep(delay).await;
            }
        }
        self.check_cancelled(job_id).await?;
        Ok(outcome)
    }

    async fn embed_one(&self, record: &ContentRecord) -> Result<()> {
        let vector = self.embedder.embed(&record.embedding_text()).await?;
        self.vectors
            .upsert(VectorRecord {
                id: record.id.clone(),
                vector,
                metadata: record.vector_metadata(self.config.excerpt_chars),
            })
            .await
    }

    async fn cleanup(&self, job_id: &str) -> Result<RunOutcome> {
        let valid: HashSet<String> = self.content.valid_ids().await?;
        let indexed = self.vectors.list_all_ids(self.config.list_page_size).await?;
        let orphans: Vec<&String> = indexed.iter().filter(|id| !valid.contains(*id)).collect();
        let orphan_count = orphans.len() as u64;

        debug!(
            job_id,
            evaluated = indexed.len(),
            orphans = orphan_count,
            "Diffed index against content"
        );

        let mut outcome = RunOutcome::new(indexed.len() as u64);
        self.registry
            .record_progress(job_id, outcome.update(orphan_count))
            .await?;

        for id in orphans {
            self.check_cancelled(job_id).await?;

            match self.vectors.delete(id).await {
                Ok(()) => {
                    outcome.processed += 1;
                    trace!(job_id, record_id = %id, "Deleted orphaned vector");
                }
                Err(e) => {
                    warn!(job_id, record_id = %id, error = %e, "Failed to delete orphaned vector");
                    outcome.record_failure(&e);
                }
            }

            self.registry
                .record_progress(job_id, outcome.update(orphan_count))
                .await?;
        }
        self.check_cancelled(job_id).await?;
        Ok(outcome)
    }

    async fn check_cancelled(&self, job_id: &str) -> Result<()> {
        if self.registry.is_cancel_requested(job_id).await? {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_rounds() {
        let mut outcome = RunOutcome::new(3);
        assert_eq!(outcome.progress(3), 0);
        outcome.processed = 1;
        assert_eq!(outcome.progress(3), 33);
        outcome.failed = 1;
        assert_eq!(outcome.progress(3), 67);
    }

    #[test]
    fn test_progress_of_empty_run_is_complete() {
        assert_eq!(RunOutcome::new(0).progress(0), 100);
    }
}
