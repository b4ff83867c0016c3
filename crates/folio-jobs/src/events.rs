//! Job lifecycle events pushed to subscribers.

use serde::Serialize;

use folio_core::JobType;

/// Event emitted by the job registry on every state change.
///
/// Delivery is best effort: slow subscribers may miss events and should fall
/// back to polling the job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    JobQueued {
        job_id: String,
        job_type: JobType,
    },
    JobStarted {
        job_id: String,
        job_type: JobType,
    },
    JobProgress {
        job_id: String,
        progress: u8,
        items_processed: u64,
        items_failed: u64,
        total_items: u64,
    },
    JobCompleted {
        job_id: String,
        job_type: JobType,
        items_processed: u64,
        items_failed: u64,
    },
    JobFailed {
        job_id: String,
        job_type: JobType,
        error: String,
    },
}

impl SyncEvent {
    /// Event name, e.g. `job_progress`.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::JobQueued { .. } => "job_queued",
            SyncEvent::JobStarted { .. } => "job_started",
            SyncEvent::JobProgress { .. } => "job_progress",
            SyncEvent::JobCompleted { .. } => "job_completed",
            SyncEvent::JobFailed { .. } => "job_failed",
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            SyncEvent::JobQueued { job_id, .. }
            | SyncEvent::JobStarted { job_id, .. }
            | SyncEvent::JobProgress { job_id, .. }
            | SyncEvent::JobCompleted { job_id, .. }
            | SyncEvent::JobFailed { job_id, .. } => job_id,
        }
    }
}
