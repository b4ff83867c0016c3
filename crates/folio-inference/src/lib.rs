//! # folio-inference
//!
//! Embedding generators for the folio sync pipeline.
//!
//! - [`HashEmbedder`]: deterministic SHA-256 expansion, no network
//! - [`OpenAIEmbedder`]: any OpenAI-compatible `/embeddings` endpoint
//! - `MockEmbedder` (feature `mock`): failure injection for tests
//!
//! [`EmbedderConfig::from_env`] picks one from `EMBED_BACKEND`.

pub mod config;
pub mod hash;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::{EmbedderConfig, EmbedderKind};
pub use hash::HashEmbedder;

#[cfg(feature = "openai")]
pub use openai::{OpenAIEmbedConfig, OpenAIEmbedder};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
