//! # folio-jobs
//!
//! Embedding synchronization jobs for folio.
//!
//! This crate provides:
//! - [`JobRegistry`]: job records, the state machine and whole-index exclusion
//! - [`JobRunner`]: full regeneration, incremental update and cleanup
//! - [`SyncController`]: the trigger/query/cancel surface
//! - [`SyncEvent`]: lifecycle events for push-style observers
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_jobs::{SyncConfig, SyncController};
//!
//! let controller = SyncController::new(content, vectors, embedder, SyncConfig::from_env());
//! let job_id = controller.start_full_regeneration().await?;
//! let view = controller.get_job(&job_id).await;
//! ```

pub mod config;
pub mod controller;
pub mod events;
pub mod registry;
pub mod runner;
pub mod store;

pub use config::SyncConfig;
pub use controller::SyncController;
pub use events::SyncEvent;
pub use registry::JobRegistry;
pub use runner::{JobRunner, RunOutcome};
pub use store::MemoryJobStore;
