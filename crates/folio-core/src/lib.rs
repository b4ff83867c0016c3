//! # folio-core
//!
//! Core types, traits, and abstractions for the folio embedding sync pipeline.
//!
//! This crate provides the data model (content records, vector records, sync
//! jobs) and the collaborator traits the other folio crates implement.
//!
//! Log events across the workspace use the same structured field names:
//! `subsystem`, `component`, `op`, `job_id`, `job_type`, `record_id`,
//! `items_processed`, `items_failed`, `total_items`, `duration_ms`, `error`.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
