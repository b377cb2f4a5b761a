//! Case retrieval for call-center agent assist
//!
//! Similarity search over historical support conversations:
//! - In-memory case store with O(1) id lookup and snapshot persistence
//! - Flat cosine similarity index (exact k-NN, swap-on-rebuild)
//! - Retrieval engine with similarity threshold and outcome filtering
//! - Knowledge-base construction from raw chat exports
//! - Per-topic issue insights
//! - Retrieval-backed resolution suggestions with a confidence score
//!
//! The embedding backend is pluggable through the core
//! `EmbeddingProvider` trait; `SimpleEmbedder` is a deterministic
//! hash-based implementation for tests and local development.

pub mod assist;
pub mod embeddings;
pub mod engine;
pub mod index;
pub mod insights;
pub mod knowledge;
pub mod store;

pub use assist::{assist, confidence_score, suggest_resolutions, AssistReport, ResolutionSuggestion};
pub use embeddings::{EmbedderConfig, SimpleEmbedder};
pub use engine::{EngineConfig, RetrievalEngine, SearchOptions};
pub use index::FlatIndex;
pub use insights::{insight_for_topic, topic_insights, TopicInsight};
pub use knowledge::{
    classify_topic, detect_outcome, group_messages, load_chat_dir, load_chat_log,
    representative_text, ChatLogFile, KnowledgeBuilder,
};
pub use store::CaseStore;
