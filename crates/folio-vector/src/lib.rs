//! # folio-vector
//!
//! Clients for the external vector index.
//!
//! - [`UpstashVectorIndex`]: Upstash Vector REST API
//! - [`MemoryVectorIndex`]: in-process cosine index for local runs and tests

pub mod memory;
pub mod upstash;

pub use memory::{cosine_similarity, MemoryVectorIndex};
pub use upstash::{UpstashConfig, UpstashVectorIndex};
