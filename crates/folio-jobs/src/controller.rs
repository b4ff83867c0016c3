//! Public surface of the sync pipeline.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use folio_core::defaults;
use folio_core::{
    storage_estimate, ContentStore, EmbeddingGenerator, IndexStats, IndexStatus, JobStore,
    JobType, JobView, Result, SearchProbe, VectorQuery, VectorStoreClient,
};

use crate::config::SyncConfig;
use crate::events::SyncEvent;
use crate::registry::JobRegistry;
use crate::runner::JobRunner;
use crate::store::MemoryJobStore;

/// Trigger, query and cancel sync jobs.
///
/// Triggers return as soon as the job is registered; the work runs on a
/// spawned task. Apart from trigger rejection, every failure is reported as
/// data (`None`, `false`, a Failed job, an error status) rather than an error.
pub struct SyncController {
    registry: Arc<JobRegistry>,
    runner: Arc<JobRunner>,
    content: Arc<dyn ContentStore>,
    vectors: Arc<dyn VectorStoreClient>,
    embedder: Arc<dyn EmbeddingGenerator>,
}

impl SyncController {
    /// Controller with an in-memory job store.
    pub fn new(
        content: Arc<dyn ContentStore>,
        vectors: Arc<dyn VectorStoreClient>,
        embedder: Arc<dyn EmbeddingGenerator>,
        config: SyncConfig,
    ) -> Self {
        Self::with_job_store(
            content,
            vectors,
            embedder,
            Arc::new(MemoryJobStore::new()),
            config,
        )
    }

    pub fn with_job_store(
        content: Arc<dyn ContentStore>,
        vectors: Arc<dyn VectorStoreClient>,
        embedder: Arc<dyn EmbeddingGenerator>,
        store: Arc<dyn JobStore>,
        config: SyncConfig,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new(store).with_retention(config.job_retention));
        let runner = Arc::new(JobRunner::new(
            content.clone(),
            vectors.clone(),
            embedder.clone(),
            registry.clone(),
            config,
        ));
        Self {
            registry,
            runner,
            content,
            vectors,
            embedder,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Subscribe to job lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.registry.subscribe()
    }

    pub async fn start_full_regeneration(&self) -> Result<String> {
        self.trigger(JobType::FullRegeneration).await
    }

    pub async fn start_incremental_update(&self) -> Result<String> {
        self.trigger(JobType::IncrementalUpdate).await
    }

    pub async fn start_cleanup(&self) -> Result<String> {
        self.trigger(JobType::Cleanup).await
    }

    /// Register a job and run it on a background task. Returns the job id.
    ///
    /// Fails only with [`folio_core::Error::ScopeBusy`] or a job store error.
    pub async fn trigger(&self, job_type: JobType) -> Result<String> {
        let job = self.registry.create(job_type).await?;
        let job_id = job.id;

        if let Err(e) = self.registry.prune().await {
            warn!(subsystem = "jobs", component = "controller", error = %e, "Failed to prune jobs");
        }

        self.spawn(job_id.clone(), job_type);
        Ok(job_id)
    }

    fn spawn(&self, job_id: String, job_type: JobType) {
        let runner = self.runner.clone();
        let registry = self.registry.clone();

        tokio::spawn(async move {
            let task = {
                let runner = runner.clone();
                let job_id = job_id.clone();
                tokio::spawn(async move { runner.run(&job_id, job_type).await })
            };

            if let Err(e) = task.await {
                error!(
                    subsystem = "jobs",
                    component = "controller",
                    job_id = %job_id,
                    error = ?e,
                    "Job task panicked"
                );
                if let Err(e) = registry
                    .fail(&job_id, format!("Job task panicked: {}", e))
                    .await
                {
                    error!(job_id = %job_id, error = %e, "Failed to record panicked job");
                }
            }
        });
    }

    pub async fn get_job(&self, job_id: &str) -> Option<JobView> {
        match self.registry.get(job_id).await {
            Ok(job) => job.map(|j| j.view()),
            Err(e) => {
                error!(subsystem = "jobs", job_id, error = %e, "Failed to read job");
                None
            }
        }
    }

    /// Every retained job, newest first.
    pub async fn list_jobs(&self) -> Vec<JobView> {
        match self.registry.list().await {
            Ok(jobs) => jobs.iter().map(|j| j.view()).collect(),
            Err(e) => {
                error!(subsystem = "jobs", error = %e, "Failed to list jobs");
                Vec::new()
            }
        }
    }

    /// Request cancellation of a running job.
    pub async fn cancel_job(&self, job_id: &str) -> bool {
        self.registry
            .request_cancel(job_id)
            .await
            .unwrap_or_else(|e| {
                error!(subsystem = "jobs", job_id, error = %e, "Failed to cancel job");
                false
            })
    }

    /// Delete a finished job.
    pub async fn delete_job(&self, job_id: &str) -> bool {
        self.registry.delete(job_id).await.unwrap_or_else(|e| {
            error!(subsystem = "jobs", job_id, error = %e, "Failed to delete job");
            false
        })
    }

    /// Index statistics. Collaborator failures yield an `error` status.
    pub async fn get_index_stats(&self) -> IndexStats {
        match self.collect_index_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "controller",
                    error = %e,
                    "Failed to collect index stats"
                );
                IndexStats::unavailable(self.embedder.dimension())
            }
        }
    }

    async fn collect_index_stats(&self) -> Result<IndexStats> {
        let info = self.vectors.info().await?;
        let valid = self.content.valid_ids().await?;
        let categories = self.content.categories().await?;
        let page_size = self.runner.config().list_page_size;
        let indexed = self.vectors.list_all_ids(page_size).await?;

        let orphaned = indexed.iter().filter(|id| !valid.contains(*id)).count() as u64;

        let content_records = valid.len() as u64;
        let index_status = if orphaned > 0 || info.vector_count != content_records {
            IndexStatus::Degraded
        } else {
            IndexStatus::Healthy
        };
        let dimensions = if info.dimension > 0 {
            info.dimension
        } else {
            self.embedder.dimension()
        };

        debug!(
            subsystem = "jobs",
            component = "controller",
            total_vectors = info.vector_count,
            content_records,
            orphaned,
            "Collected index stats"
        );

        Ok(IndexStats {
            total_vectors: info.vector_count,
            dimensions,
            content_records,
            categories: categories.len() as u64,
            orphaned_vectors: orphaned,
            index_status,
            storage_estimate: storage_estimate(info.vector_count, dimensions),
            last_updated: Utc::now(),
        })
    }

    /// Embed `query` (default "software engineer") and rank it against the index.
    pub async fn test_search(&self, query: Option<&str>) -> SearchProbe {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(defaults::SEARCH_PROBE_QUERY)
            .to_string();

        let result = match self.embedder.embed(&query).await {
            Ok(vector) => {
                self.vectors
                    .query(VectorQuery::Vector(vector), defaults::SEARCH_PROBE_TOP_K)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(hits) => {
                info!(
                    subsystem = "jobs",
                    component = "controller",
                    query = %query,
                    result_count = hits.len(),
                    "Search probe succeeded"
                );
                SearchProbe {
                    success: true,
                    result_count: hits.len(),
                    query,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "controller",
                    query = %query,
                    error = %e,
                    "Search probe failed"
                );
                SearchProbe {
                    success: false,
                    result_count: 0,
                    query,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
