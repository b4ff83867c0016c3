//! Job registry: the only writer of job records.
//!
//! Every mutation runs under one async mutex, so check-then-write sequences
//! (scope exclusion, transition validation, cancellation) are atomic. Reads go
//! straight to the store.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use folio_core::defaults;
use folio_core::{EmbeddingJob, Error, JobStatus, JobStore, JobType, JobUpdate, Result};

use crate::events::SyncEvent;
use crate::store::MemoryJobStore;

/// Concurrency-safe owner of [`EmbeddingJob`] records and their state machine.
pub struct JobRegistry {
    store: Arc<dyn JobStore>,
    write_lock: Mutex<()>,
    event_tx: broadcast::Sender<SyncEvent>,
    retention: usize,
}

impl JobRegistry {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            store,
            write_lock: Mutex::new(()),
            event_tx,
            retention: defaults::JOB_RETENTION,
        }
    }

    /// Registry over a fresh [`MemoryJobStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryJobStore::new()))
    }

    /// Keep at most `retention` finished jobs when pruning.
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    /// Create a pending job.
    ///
    /// Fails with [`Error::ScopeBusy`] when `job_type` is whole-index and
    /// another whole-index job is pending or running.
    pub async fn create(&self, job_type: JobType) -> Result<EmbeddingJob> {
        let _guard = self.write_lock.lock().await;

        if job_type.is_whole_index() {
            let busy = self
                .store
                .list()
                .await?
                .into_iter()
                .find(|j| j.job_type.is_whole_index() && j.is_active());
            if let Some(active) = busy {
                debug!(
                    subsystem = "jobs",
                    component = "registry",
                    job_type = %job_type,
                    active_job_id = %active.id,
                    "Rejected trigger: whole-index job already active"
                );
                return Err(Error::ScopeBusy {
                    active_job_id: active.id,
                });
            }
        }

        let job = EmbeddingJob::new(job_type);
        self.store.insert(job.clone()).await?;
        info!(
            subsystem = "jobs",
            component = "registry",
            job_id = %job.id,
            job_type = %job_type,
            "Job queued"
        );
        self.emit(SyncEvent::JobQueued {
            job_id: job.id.clone(),
            job_type,
        });
        Ok(job)
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<EmbeddingJob>> {
        self.store.get(job_id).await
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Result<Vec<EmbeddingJob>> {
        let mut jobs = self.store.list().await?;
        jobs.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(jobs)
    }

    /// Move a job to `next` and apply `update`.
    ///
    /// While Running, `progress` never decreases and stays below 100;
    /// Completed sets it to 100. `items_processed` is clamped to
    /// `total_items`. Terminal jobs reject every transition.
    pub async fn transition(
        &self,
        job_id: &str,
        next: JobStatus,
        update: JobUpdate,
    ) -> Result<EmbeddingJob> {
        let _guard = self.write_lock.lock().await;
        let mut job = self
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        if !job.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                job_id: job_id.to_string(),
                from: job.status,
                to: next,
            });
        }

        let previous = job.status;
        apply_update(&mut job, next, update);
        self.store.update(job.clone()).await?;

        self.emit(match (previous, next) {
            (JobStatus::Pending, JobStatus::Running) => SyncEvent::JobStarted {
                job_id: job.id.clone(),
                job_type: job.job_type,
            },
            (_, JobStatus::Completed) => SyncEvent::JobCompleted {
                job_id: job.id.clone(),
                job_type: job.job_type,
                items_processed: job.items_processed,
                items_failed: job.items_failed,
            },
            (_, JobStatus::Failed) => SyncEvent::JobFailed {
                job_id: job.id.clone(),
                job_type: job.job_type,
                error: job.error_message.clone().unwrap_or_default(),
            },
            _ => SyncEvent::JobProgress {
                job_id: job.id.clone(),
                progress: job.progress,
                items_processed: job.items_processed,
                items_failed: job.items_failed,
                total_items: job.total_items,
            },
        });
        Ok(job)
    }

    /// Pending -> Running.
    pub async fn start(&self, job_id: &str) -> Result<EmbeddingJob> {
        self.transition(job_id, JobStatus::Running, JobUpdate::default())
            .await
    }

    /// Running -> Running with new counters.
    pub async fn record_progress(&self, job_id: &str, update: JobUpdate) -> Result<EmbeddingJob> {
        self.transition(job_id, JobStatus::Running, update).await
    }

    /// Running -> Completed.
    pub async fn complete(&self, job_id: &str, update: JobUpdate) -> Result<EmbeddingJob> {
        self.transition(job_id, JobStatus::Completed, update).await
    }

    /// Move a job to Failed with `message`.
    ///
    /// A job that never left Pending is started first so observers still see
    /// `Pending -> Running -> Failed`.
    pub async fn fail(&self, job_id: &str, message: impl Into<String>) -> Result<EmbeddingJob> {
        let pending = matches!(
            self.store.get(job_id).await?,
            Some(ref job) if job.status == JobStatus::Pending
        );
        if pending {
            self.start(job_id).await?;
        }
        self.transition(
            job_id,
            JobStatus::Failed,
            JobUpdate::default().error(message),
        )
        .await
    }

    /// Set the cooperative cancellation flag on a running job.
    ///
    /// Returns `false` for unknown or non-running jobs.
    pub async fn request_cancel(&self, job_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut job = match self.store.get(job_id).await? {
            Some(job) if job.status == JobStatus::Running => job,
            _ => return Ok(false),
        };
        job.cancel_requested = true;
        self.store.update(job).await?;
        info!(
            subsystem = "jobs",
            component = "registry",
            job_id,
            "Cancellation requested"
        );
        Ok(true)
    }

    pub async fn is_cancel_requested(&self, job_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get(job_id)
            .await?
            .map(|j| j.cancel_requested)
            .unwrap_or(false))
    }

    /// Remove a finished job. Active and unknown jobs return `false`.
    pub async fn delete(&self, job_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match self.store.get(job_id).await? {
            Some(job) if job.status.is_terminal() => self.store.remove(job_id).await,
            Some(_) => {
                debug!(
                    subsystem = "jobs",
                    component = "registry",
                    job_id,
                    "Refused to delete active job"
                );
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Drop finished jobs beyond the newest `retention`. Returns the count removed.
    pub async fn prune(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut finished: Vec<EmbeddingJob> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|j| j.status.is_terminal())
            .collect();
        if finished.len() <= self.retention {
            return Ok(0);
        }

        finished.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let mut removed = 0;
        for job in finished.into_iter().skip(self.retention) {
            if self.store.remove(&job.id).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            warn!(
                subsystem = "jobs",
                component = "registry",
                removed,
                retention = self.retention,
                "Pruned finished jobs"
            );
        }
        Ok(removed)
    }
}

fn apply_update(job: &mut EmbeddingJob, next: JobStatus, update: JobUpdate) {
    if let Some(total) = update.total_items {
        job.total_items = total;
    }
    if let Some(processed) = update.items_processed {
        job.items_processed = processed.max(job.items_processed);
    }
    if let Some(failed) = update.items_failed {
        job.items_failed = failed.max(job.items_failed);
    }
    job.items_processed = job.items_processed.min(job.total_items);

    match next {
        JobStatus::Running => {
            if let Some(progress) = update.progress {
                job.progress = progress.min(99).max(job.progress);
            }
        }
        JobStatus::Completed => {
            job.progress = 100;
            job.ended_at = Some(Utc::now());
        }
        JobStatus::Failed => {
            job.error_message = update.error_message;
            job.ended_at = Some(Utc::now());
        }
        JobStatus::Pending => {}
    }
    job.status = next;
}
