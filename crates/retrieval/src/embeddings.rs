//! Embedding backends
//!
//! The engine talks to any backend through the core `EmbeddingProvider`
//! trait. `SimpleEmbedder` is a deterministic hash-based implementation
//! that needs no model download; production deployments plug a real
//! sentence-embedding backend in behind the same trait.

use async_trait::async_trait;

use case_assist_core::{EmbeddingProvider, Result};

/// Embedder configuration
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    /// Embedding dimension
    pub dim: usize,
    /// Normalize embeddings to unit length
    pub normalize: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            dim: 384,
            normalize: true,
        }
    }
}

/// Deterministic hash-based embedder (no model required)
///
/// Identical input always yields the identical vector, so it satisfies the
/// provider contract. Semantic quality is whatever character-bag hashing
/// gives; good enough for tests and wiring checks.
pub struct SimpleEmbedder {
    config: EmbedderConfig,
}

impl SimpleEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.config.dim];

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % self.config.dim;
            embedding[idx] += 1.0;
        }

        if self.config.normalize {
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut embedding {
                    *v /= norm;
                }
            }
        }

        embedding
    }
}

impl Default for SimpleEmbedder {
    fn default() -> Self {
        Self::new(EmbedderConfig::default())
    }
}

#[async_trait]
impl EmbeddingProvider for SimpleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dim(&self) -> usize {
        self.config.dim
    }

    fn name(&self) -> &str {
        "simple-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_is_unit_length() {
        let embedder = SimpleEmbedder::default();
        let embedding = embedder.embed("my bill looks wrong this month").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = SimpleEmbedder::default();
        let a = embedder.embed("roaming charges overseas").await.unwrap();
        let b = embedder.embed("roaming charges overseas").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = SimpleEmbedder::default();
        let embedding = embedder.embed("").await.unwrap();
        assert!(embedding.iter().all(|x| *x == 0.0));
    }
}
