//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Converts free text into a fixed-length embedding vector.
///
/// Any concrete embedding backend (a local model, a hosted API) implements
/// this trait. Callers rely only on the contract: deterministic output for
/// identical input within a provider version, and a fixed dimension per
/// provider instance. Mixing providers within one store is disallowed.
///
/// # Example
///
/// ```ignore
/// let provider: Arc<dyn EmbeddingProvider> = Arc::new(SimpleEmbedder::default());
/// let vector = provider.embed("customer cannot log in").await?;
/// assert_eq!(vector.len(), provider.dim());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    /// Embed a single text. May suspend on network I/O.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension produced by this provider
    fn dim(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
