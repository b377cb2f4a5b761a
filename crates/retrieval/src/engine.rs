//! Retrieval engine
//!
//! Turns a free-text query into a ranked list of similar historical cases:
//! embed the query, consult the similarity index, filter by similarity
//! threshold and outcome, and project survivors into case summaries.
//!
//! The store and index travel together behind one lock, so a rebuild swaps
//! both atomically and in-flight queries observe either the fully old or
//! fully new state, never a mix.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use unicode_segmentation::UnicodeSegmentation;

use case_assist_config::constants::retrieval;
use case_assist_core::{
    CaseIndex, CaseRecord, CaseSummary, EmbeddingProvider, Error, Outcome, Result, ScoredCase,
};

use crate::index::{l2_normalize, FlatIndex};
use crate::store::CaseStore;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Candidate multiplier applied before post-filtering, so the outcome
    /// filter does not starve the result set
    pub over_fetch_factor: usize,
    /// Budget for the embedding call, covering the single retry
    pub provider_timeout: Duration,
    /// Retry the embedding call once on transient failure
    pub retry_enabled: bool,
    /// Backoff before the retry
    pub retry_backoff: Duration,
    /// Excerpt length in case summaries, in grapheme clusters
    pub excerpt_max_graphemes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            over_fetch_factor: retrieval::OVER_FETCH_FACTOR,
            provider_timeout: Duration::from_millis(retrieval::PROVIDER_TIMEOUT_MS),
            retry_enabled: true,
            retry_backoff: Duration::from_millis(retrieval::RETRY_BACKOFF_MS),
            excerpt_max_graphemes: retrieval::EXCERPT_MAX_GRAPHEMES,
        }
    }
}

impl From<&case_assist_config::RetrievalSettings> for EngineConfig {
    fn from(settings: &case_assist_config::RetrievalSettings) -> Self {
        Self {
            over_fetch_factor: settings.over_fetch_factor,
            provider_timeout: Duration::from_millis(settings.provider_timeout_ms),
            retry_enabled: settings.retry_enabled,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            excerpt_max_graphemes: settings.excerpt_max_graphemes,
        }
    }
}

/// Per-query options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Number of cases to return
    pub top_k: usize,
    /// Similarity floor; candidates below it never surface regardless of k
    pub similarity_threshold: f32,
    /// Only return cases with this outcome
    pub outcome_filter: Option<Outcome>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: retrieval::DEFAULT_TOP_K,
            similarity_threshold: retrieval::SIMILARITY_THRESHOLD,
            outcome_filter: None,
        }
    }
}

impl From<&case_assist_config::RetrievalSettings> for SearchOptions {
    fn from(settings: &case_assist_config::RetrievalSettings) -> Self {
        Self {
            top_k: settings.top_k,
            similarity_threshold: settings.similarity_threshold,
            outcome_filter: None,
        }
    }
}

impl SearchOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome_filter = Some(outcome);
        self
    }
}

/// Store and index that are always swapped together
struct EngineState<I> {
    store: Arc<CaseStore>,
    index: Arc<I>,
}

/// Similarity-based case retrieval over an owned store and index
///
/// Engines are explicitly constructed around a caller-owned store; there
/// is no ambient knowledge base, so a process can hold several independent
/// engines (one per tenant, or isolated test instances).
pub struct RetrievalEngine<I: CaseIndex = FlatIndex> {
    provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<EngineState<I>>,
    config: EngineConfig,
}

impl<I: CaseIndex> std::fmt::Debug for RetrievalEngine<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalEngine<FlatIndex> {
    /// Build an engine with the default flat index
    pub fn new(
        store: Arc<CaseStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::with_index_type(store, provider, config)
    }
}

impl<I: CaseIndex> RetrievalEngine<I> {
    /// Build an engine with a custom index implementation
    pub fn with_index_type(
        store: Arc<CaseStore>,
        provider: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        if provider.dim() != store.dim() {
            return Err(Error::DimensionMismatch {
                expected: store.dim(),
                actual: provider.dim(),
            });
        }

        let index = I::build(store.dim(), store.all())?;
        tracing::info!(
            cases = index.len(),
            dim = store.dim(),
            provider = provider.name(),
            "Retrieval engine ready"
        );

        Ok(Self {
            provider,
            state: RwLock::new(EngineState {
                store,
                index: Arc::new(index),
            }),
            config,
        })
    }

    /// Replace the case store and rebuild the index.
    ///
    /// The new index is constructed off-lock; the swap itself holds the
    /// write lock only for two pointer assignments.
    pub fn rebuild(&self, store: Arc<CaseStore>) -> Result<()> {
        if store.dim() != self.provider.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.provider.dim(),
                actual: store.dim(),
            });
        }

        let index = I::build(store.dim(), store.all())?;
        tracing::info!(cases = index.len(), "Rebuilt similarity index");

        let mut state = self.state.write();
        state.store = store;
        state.index = Arc::new(index);
        Ok(())
    }

    /// The store currently backing queries
    pub fn store(&self) -> Arc<CaseStore> {
        Arc::clone(&self.state.read().store)
    }

    /// Number of cases currently indexed
    pub fn case_count(&self) -> usize {
        self.state.read().index.len()
    }

    /// Find historical cases similar to `query_text`.
    ///
    /// Candidates below `options.similarity_threshold` never surface; an
    /// outcome filter then narrows the survivors; at most `options.top_k`
    /// summaries come back in index order. Zero survivors is an empty
    /// vector, not an error.
    pub async fn find_similar(
        &self,
        query_text: &str,
        options: &SearchOptions,
    ) -> Result<Vec<CaseSummary>> {
        if options.top_k == 0 {
            return Err(Error::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        if query_text.trim().is_empty() {
            return Err(Error::InvalidArgument("query text is empty".to_string()));
        }

        let mut query_vector = self.embed_query(query_text).await?;
        if query_vector.iter().all(|x| *x == 0.0) {
            return Err(Error::InvalidArgument(
                "query embedded to a zero vector".to_string(),
            ));
        }
        l2_normalize(&mut query_vector);

        // Snapshot the state so the store and index stay consistent even
        // if a rebuild lands mid-query
        let (store, index) = {
            let state = self.state.read();
            (Arc::clone(&state.store), Arc::clone(&state.index))
        };

        let fetch = options.top_k.saturating_mul(self.config.over_fetch_factor.max(1));
        let candidates = index.query(&query_vector, fetch)?;

        let mut summaries = Vec::with_capacity(options.top_k);
        for ScoredCase { id, score } in candidates {
            // Candidates arrive sorted descending, so the first score
            // under the threshold ends the scan
            if score < options.similarity_threshold {
                break;
            }

            let record = store.get(&id)?;
            if let Some(filter) = options.outcome_filter {
                if record.outcome != filter {
                    continue;
                }
            }

            summaries.push(self.summarize(record, score));
            if summaries.len() == options.top_k {
                break;
            }
        }

        tracing::debug!(
            results = summaries.len(),
            top_k = options.top_k,
            threshold = options.similarity_threshold,
            "Similarity query complete"
        );
        Ok(summaries)
    }

    /// Embed the query under one timeout that covers the optional retry,
    /// so the caller always gets a definitive result within the budget
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let attempts = async {
            match self.embed_once(text).await {
                Err(Error::EmbeddingUnavailable(reason)) if self.config.retry_enabled => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        %reason,
                        "Embedding attempt failed, retrying once"
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                    self.embed_once(text).await
                }
                other => other,
            }
        };

        match tokio::time::timeout(self.config.provider_timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(Error::EmbeddingUnavailable(format!(
                "No response from {} within {:?}",
                self.provider.name(),
                self.config.provider_timeout
            ))),
        }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self
            .provider
            .embed(text)
            .await
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        if vector.len() != self.provider.dim() {
            return Err(Error::EmbeddingUnavailable(format!(
                "Provider {} returned {} dimensions, expected {}",
                self.provider.name(),
                vector.len(),
                self.provider.dim()
            )));
        }

        Ok(vector)
    }

    fn summarize(&self, record: &CaseRecord, score: f32) -> CaseSummary {
        CaseSummary {
            id: record.id.clone(),
            topic: record.topic.clone(),
            outcome: record.outcome,
            similarity: score,
            excerpt: excerpt(&record.text, self.config.excerpt_max_graphemes),
        }
    }
}

/// First `max` grapheme clusters of `text`, with an ellipsis when truncated
fn excerpt(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbedderConfig, SimpleEmbedder};
    use chrono::{TimeZone, Utc};

    async fn small_store(provider: &SimpleEmbedder) -> CaseStore {
        let mut store = CaseStore::new(provider.dim());
        let texts = [
            ("c1", "my bill has a charge I do not recognise"),
            ("c2", "cannot log in to my account portal"),
        ];
        for (i, (id, text)) in texts.iter().enumerate() {
            let embedding = provider.embed(text).await.unwrap();
            store
                .upsert(CaseRecord::new(
                    *id,
                    *text,
                    embedding,
                    Outcome::Resolved,
                    "billing",
                    Utc.with_ymd_and_hms(2024, 6, 1 + i as u32, 12, 0, 0).unwrap(),
                ))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_engine_rejects_provider_store_dimension_mismatch() {
        let provider = Arc::new(SimpleEmbedder::new(EmbedderConfig {
            dim: 8,
            normalize: true,
        }));
        let store = Arc::new(CaseStore::new(16));

        let err = RetrievalEngine::new(store, provider, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_rebuild_swaps_store_and_index_together() {
        let provider = Arc::new(SimpleEmbedder::default());
        let store = Arc::new(small_store(&provider).await);
        let engine =
            RetrievalEngine::new(store, Arc::clone(&provider) as _, EngineConfig::default())
                .unwrap();
        assert_eq!(engine.case_count(), 2);

        let mut bigger = small_store(&provider).await;
        let text = "roaming pack did not activate overseas";
        bigger
            .upsert(CaseRecord::new(
                "c3",
                text,
                provider.embed(text).await.unwrap(),
                Outcome::Escalated,
                "roaming",
                Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap(),
            ))
            .unwrap();

        engine.rebuild(Arc::new(bigger)).unwrap();
        assert_eq!(engine.case_count(), 3);
        assert!(engine.store().get("c3").is_ok());
    }

    #[tokio::test]
    async fn test_zero_top_k_is_invalid() {
        let provider = Arc::new(SimpleEmbedder::default());
        let store = Arc::new(small_store(&provider).await);
        let engine = RetrievalEngine::new(store, provider, EngineConfig::default()).unwrap();

        let options = SearchOptions::default().with_top_k(0);
        let err = engine.find_similar("billing issue", &options).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = case_assist_config::RetrievalSettings::default();
        let config = EngineConfig::from(&settings);
        assert_eq!(config.over_fetch_factor, 3);
        assert_eq!(config.provider_timeout, Duration::from_millis(5_000));

        let options = SearchOptions::from(&settings);
        assert_eq!(options.top_k, 5);
        assert!(options.outcome_filter.is_none());
    }

    #[test]
    fn test_excerpt_truncates_on_grapheme_boundary() {
        assert_eq!(excerpt("short", 10), "short");

        let truncated = excerpt("a̐éö̲ and more text", 3);
        assert!(truncated.starts_with("a̐éö̲"));
        assert!(truncated.ends_with('…'));
    }
}
