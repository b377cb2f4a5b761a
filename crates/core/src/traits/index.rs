//! Similarity index trait

use crate::case::{CaseRecord, ScoredCase};
use crate::Result;

/// k-nearest-neighbor search over case embeddings.
///
/// `build` constructs a complete index from a record set; the engine swaps
/// whole instances under a write lock, so in-flight queries never observe a
/// partially built index. The default implementation is an exact flat
/// index; approximate structures may substitute behind this trait at
/// larger scales.
pub trait CaseIndex: Send + Sync + Sized {
    /// Build a fresh index over `records`.
    ///
    /// Fails with `DimensionMismatch` when a record's embedding length
    /// differs from `dim`. Building over zero records succeeds and yields
    /// an empty index.
    fn build(dim: usize, records: &[CaseRecord]) -> Result<Self>;

    /// The `k` nearest cases by cosine similarity, descending.
    ///
    /// Ties break by most recent record timestamp, then id ascending, so
    /// results are deterministic. Fails with `EmptyIndex` when nothing has
    /// been indexed, `InvalidArgument` when `k == 0`, and
    /// `DimensionMismatch` when the query vector has the wrong length.
    /// Fewer than `k` indexed cases returns all of them.
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredCase>>;

    /// Number of indexed cases
    fn len(&self) -> usize;

    /// True when nothing has been indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
