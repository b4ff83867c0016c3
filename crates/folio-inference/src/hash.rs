//! Deterministic hash-based embedding generator.
//!
//! Expands the SHA-256 digest of the text in counter mode into `dimension`
//! values in `[-1, 1]` and L2-normalizes the result. Identical text always
//! yields the identical vector, with no external service involved.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::trace;

use folio_core::{EmbeddingGenerator, Error, Result, Vector};

/// Values drawn from one SHA-256 block (32 bytes / 4).
const VALUES_PER_BLOCK: usize = 8;

/// Embedding generator that needs no model or network.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_name: format!("hash-sha256-{}", dimension),
        }
    }

    /// Embed without going through the async trait.
    pub fn embed_sync(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".to_string()));
        }

        let mut values = Vec::with_capacity(self.dimension);
        let mut block: u32 = 0;
        while values.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(block.to_le_bytes());
            let digest = hasher.finalize();

            for chunk in digest.chunks_exact(4).take(VALUES_PER_BLOCK) {
                if values.len() == self.dimension {
                    break;
                }
                let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                values.push((raw as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32);
            }
            block = block.wrapping_add(1);
        }

        normalize(&mut values);
        trace!(
            subsystem = "inference",
            component = "hash",
            dimension = self.dimension,
            "Generated hash embedding"
        );
        Ok(values)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(folio_core::defaults::EMBED_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingGenerator for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vector> {
        self.embed_sync(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn normalize(vec: &mut [f32]) {
    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        vec.iter_mut().for_each(|x| *x /= magnitude);
    }
}
