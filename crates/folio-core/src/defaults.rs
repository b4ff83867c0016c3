//! Centralized default constants for the folio sync pipeline.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding vector dimension (matches the hosted index configuration).
pub const EMBED_DIMENSION: usize = 1024;

/// Default model name for the OpenAI-compatible embedding backend.
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// Default base URL for the OpenAI-compatible embedding backend.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// VECTOR INDEX
// =============================================================================

/// Maximum characters of the body kept in vector metadata.
pub const EXCERPT_CHARS: usize = 500;

/// Page size used when enumerating index ids.
pub const LIST_PAGE_SIZE: usize = 100;

/// Result count used by the search probe.
pub const SEARCH_PROBE_TOP_K: usize = 5;

/// Query used by the search probe when the caller gives none.
pub const SEARCH_PROBE_QUERY: &str = "software engineer";

/// Timeout for vector index requests (seconds).
pub const VECTOR_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// SYNC JOBS
// =============================================================================

/// Delay between items in a sync loop (milliseconds).
pub const SYNC_ITEM_DELAY_MS: u64 = 100;

/// Look-back window for incremental updates (hours).
pub const INCREMENTAL_WINDOW_HOURS: i64 = 24;

/// Number of finished jobs retained in the registry.
pub const JOB_RETENTION: usize = 100;

/// Capacity of the sync event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Error message recorded when a job is cancelled.
pub const CANCELLED_MESSAGE: &str = "Cancelled by user";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;
