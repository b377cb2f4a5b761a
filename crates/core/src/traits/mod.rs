//! Capability traits for pluggable backends
//!
//! Components implement these traits so concrete backends can be swapped
//! without touching callers:
//! - `EmbeddingProvider`: text -> fixed-length vector (the single
//!   suspension point in the system)
//! - `CaseIndex`: k-nearest-neighbor search over case embeddings

mod embedder;
mod index;

pub use embedder::EmbeddingProvider;
pub use index::CaseIndex;
