//! Environment-driven embedder selection.

use std::sync::Arc;

use tracing::info;

use folio_core::defaults;
use folio_core::{EmbeddingGenerator, Error, Result};

use crate::hash::HashEmbedder;
#[cfg(feature = "openai")]
use crate::openai::{OpenAIEmbedConfig, OpenAIEmbedder};

/// Which embedding backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Deterministic local hashing.
    Hash,
    /// OpenAI-compatible HTTP API.
    OpenAI,
}

impl std::str::FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Config(format!(
                "Unknown EMBED_BACKEND '{}' (expected hash or openai)",
                other
            ))),
        }
    }
}

/// Embedder settings.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub kind: EmbedderKind,
    pub dimension: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Hash,
            dimension: defaults::EMBED_DIMENSION,
        }
    }
}

impl EmbedderConfig {
    /// Read `EMBED_BACKEND` (default `hash`) and `EMBED_DIMENSION`.
    pub fn from_env() -> Result<Self> {
        let kind = match std::env::var("EMBED_BACKEND") {
            Ok(v) if !v.trim().is_empty() => v.parse()?,
            _ => EmbedderKind::Hash,
        };
        let dimension = match std::env::var("EMBED_DIMENSION") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| Error::Config(format!("Invalid EMBED_DIMENSION '{}'", v)))?,
            Err(_) => defaults::EMBED_DIMENSION,
        };
        Ok(Self { kind, dimension })
    }

    /// Build the configured generator.
    pub fn build(&self) -> Result<Arc<dyn EmbeddingGenerator>> {
        let generator: Arc<dyn EmbeddingGenerator> = match self.kind {
            EmbedderKind::Hash => Arc::new(HashEmbedder::new(self.dimension)),
            #[cfg(feature = "openai")]
            EmbedderKind::OpenAI => Arc::new(OpenAIEmbedder::new(
                OpenAIEmbedConfig::from_env().with_dimension(self.dimension),
            )?),
            #[cfg(not(feature = "openai"))]
            EmbedderKind::OpenAI => {
                return Err(Error::Config(
                    "EMBED_BACKEND=openai requires the openai feature".to_string(),
                ))
            }
        };

        info!(
            subsystem = "inference",
            model = generator.model_name(),
            dimension = generator.dimension(),
            "Embedding generator ready"
        );
        Ok(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_kind_parse() {
        assert_eq!("hash".parse::<EmbedderKind>().unwrap(), EmbedderKind::Hash);
        assert_eq!("OpenAI".parse::<EmbedderKind>().unwrap(), EmbedderKind::OpenAI);
        assert!(matches!(
            "ollama".parse::<EmbedderKind>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_build_hash_generator() {
        let config = EmbedderConfig {
            kind: EmbedderKind::Hash,
            dimension: 32,
        };
        let generator = config.build().unwrap();
        assert_eq!(generator.dimension(), 32);
        assert_eq!(generator.model_name(), "hash-sha256-32");
    }

    #[test]
    fn test_default_config() {
        let config = EmbedderConfig::default();
        assert_eq!(config.kind, EmbedderKind::Hash);
        assert_eq!(config.dimension, 1024);
    }
}
