//! Flat similarity index
//!
//! Exact cosine k-NN over case embeddings. Vectors are L2-normalized at
//! insertion, so cosine similarity reduces to a dot product at query time.
//! O(n * dim) build and scan; adequate for the hundreds-to-thousands of
//! cases a single knowledge base holds.

use chrono::{DateTime, Utc};

use case_assist_core::{CaseIndex, CaseRecord, Error, Result, ScoredCase};

/// One indexed case
#[derive(Debug, Clone)]
struct IndexEntry {
    id: String,
    timestamp: DateTime<Utc>,
    vector: Vec<f32>,
}

/// Exact flat index over normalized case embeddings
#[derive(Debug)]
pub struct FlatIndex {
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Embedding dimension this index was built for
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl CaseIndex for FlatIndex {
    fn build(dim: usize, records: &[CaseRecord]) -> Result<Self> {
        let mut entries = Vec::with_capacity(records.len());

        for record in records {
            if record.embedding.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: record.embedding.len(),
                });
            }

            let mut vector = record.embedding.clone();
            l2_normalize(&mut vector);

            entries.push(IndexEntry {
                id: record.id.clone(),
                timestamp: record.timestamp,
                vector,
            });
        }

        tracing::debug!(cases = entries.len(), dim, "Built flat similarity index");
        Ok(Self { dim, entries })
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredCase>> {
        if self.entries.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (dot(vector, &entry.vector), entry))
            .collect();

        // Score descending; ties by most recent timestamp, then id ascending
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.timestamp.cmp(&a.1.timestamp))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| ScoredCase {
                id: entry.id.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Scale a vector to unit length; zero vectors are left untouched
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_assist_core::Outcome;
    use chrono::TimeZone;

    fn record(id: &str, embedding: Vec<f32>, day: u32) -> CaseRecord {
        CaseRecord::new(
            id,
            format!("text for {}", id),
            embedding,
            Outcome::Resolved,
            "billing",
            Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_query_sorted_descending_without_duplicates() {
        let records = vec![
            record("a", vec![1.0, 0.0], 1),
            record("b", vec![0.8, 0.6], 2),
            record("c", vec![0.0, 1.0], 3),
        ];
        let index = FlatIndex::build(2, &records).unwrap();

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "a");
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);

        let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_ties_prefer_recent_then_id() {
        // Identical vectors: ordering must come from timestamp, then id
        let records = vec![
            record("older", vec![1.0, 0.0], 1),
            record("newest", vec![1.0, 0.0], 9),
            record("aa-same-day", vec![1.0, 0.0], 9),
        ];
        let index = FlatIndex::build(2, &records).unwrap();

        let results = index.query(&[1.0, 0.0], 3).unwrap();
        assert_eq!(results[0].id, "aa-same-day");
        assert_eq!(results[1].id, "newest");
        assert_eq!(results[2].id, "older");
    }

    #[test]
    fn test_identical_vector_scores_one() {
        let records = vec![record("a", vec![3.0, 4.0], 1)];
        let index = FlatIndex::build(2, &records).unwrap();

        let mut query = vec![3.0, 4.0];
        l2_normalize(&mut query);
        let results = index.query(&query, 1).unwrap();
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fewer_records_than_k_returns_all() {
        let records = vec![record("a", vec![1.0, 0.0], 1)];
        let index = FlatIndex::build(2, &records).unwrap();

        let results = index.query(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_empty_index_rejects_queries() {
        let index = FlatIndex::build(2, &[]).unwrap();
        assert!(index.is_empty());
        assert!(matches!(index.query(&[1.0, 0.0], 5), Err(Error::EmptyIndex)));
    }

    #[test]
    fn test_zero_k_is_invalid() {
        let records = vec![record("a", vec![1.0, 0.0], 1)];
        let index = FlatIndex::build(2, &records).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_wrong_query_dimension() {
        let records = vec![record("a", vec![1.0, 0.0], 1)];
        let index = FlatIndex::build(2, &records).unwrap();
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_build_rejects_wrong_record_dimension() {
        let records = vec![record("a", vec![1.0, 0.0, 0.0], 1)];
        assert!(matches!(
            FlatIndex::build(2, &records),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
