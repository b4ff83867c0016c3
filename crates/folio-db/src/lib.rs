//! # folio-db
//!
//! Content store implementations for folio.
//!
//! This crate provides:
//! - Connection pool management
//! - [`PgContentStore`], a read-only view over the `content_chunks` table
//! - [`MemoryContentStore`], an in-process store for tests and local runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use folio_db::{create_pool, PgContentStore};
//! use folio_core::ContentStore;
//!
//! let pool = create_pool("postgres://localhost/portfolio").await?;
//! let store = PgContentStore::new(pool);
//! let ids = store.valid_ids().await?;
//! ```

pub mod content;
pub mod memory;
pub mod pool;

pub use content::PgContentStore;
pub use memory::MemoryContentStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
