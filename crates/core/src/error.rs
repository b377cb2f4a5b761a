//! Error types shared across the case-assist crates

use thiserror::Error;

/// Errors surfaced by the case store, similarity index, and retrieval engine
#[derive(Error, Debug)]
pub enum Error {
    /// An embedding's length disagrees with the store/index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A persisted snapshot is unreadable or internally inconsistent.
    /// Fatal for that store instance; rebuild from source data.
    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    /// A query was issued against an index with no records
    #[error("Similarity index is empty")]
    EmptyIndex,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding provider was unreachable, timed out, or returned
    /// malformed output. The only transient condition in the taxonomy.
    #[error("Embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for conditions worth retrying once
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::EmbeddingUnavailable(_))
    }

    /// True for conditions the current store instance cannot recover from
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::CorruptStore(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
