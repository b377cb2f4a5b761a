//! Core types and traits for call-center case retrieval
//!
//! This crate provides the foundational pieces used across all other crates:
//! - Case records, outcomes, and retrieval result types
//! - Chat transcript types for knowledge-base construction
//! - Capability traits for pluggable embedding backends and similarity indexes
//! - Error types

pub mod case;
pub mod conversation;
pub mod error;
pub mod traits;

pub use case::{CaseRecord, CaseSummary, Outcome, ScoredCase};
pub use conversation::{ChatMessage, Conversation, SpeakerRole};
pub use error::{Error, Result};
pub use traits::{CaseIndex, EmbeddingProvider};
