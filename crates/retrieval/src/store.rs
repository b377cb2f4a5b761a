//! Case store
//!
//! In-memory collection of case records with O(1) id lookup, stable
//! insertion order, and snapshot persistence for cold starts.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use case_assist_core::{CaseRecord, Error, Result};

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// Persisted store snapshot: declared dimension plus all records
#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    dimension: usize,
    records: Vec<CaseRecord>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    dimension: usize,
    records: &'a [CaseRecord],
}

/// Case record collection fixed to one embedding dimension
#[derive(Debug, Clone)]
pub struct CaseStore {
    dim: usize,
    records: Vec<CaseRecord>,
    by_id: HashMap<String, usize>,
}

impl CaseStore {
    /// Create an empty store for embeddings of dimension `dim`
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            records: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Embedding dimension every record must match
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace by id.
    ///
    /// Replacement keeps the record's original insertion position, so
    /// `all()` order stays stable across outcome corrections.
    pub fn upsert(&mut self, record: CaseRecord) -> Result<()> {
        if record.embedding.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: record.embedding.len(),
            });
        }

        match self.by_id.get(&record.id) {
            Some(&slot) => {
                self.records[slot] = record;
            }
            None => {
                self.by_id.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }

        Ok(())
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Result<&CaseRecord> {
        self.by_id
            .get(id)
            .map(|&slot| &self.records[slot])
            .ok_or_else(|| Error::NotFound(format!("case {}", id)))
    }

    /// All records in insertion order
    pub fn all(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Write the full store to a single snapshot file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            dimension: self.dim,
            records: &self.records,
        };

        let data = serde_json::to_string(&snapshot).map_err(std::io::Error::other)?;
        std::fs::write(&path, data)?;

        tracing::info!(
            cases = self.records.len(),
            path = %path.as_ref().display(),
            "Saved case store snapshot"
        );
        Ok(())
    }

    /// Load a store from a snapshot file.
    ///
    /// Fails with `CorruptStore` when the blob cannot be parsed or when a
    /// record's embedding disagrees with the declared dimension; plain
    /// filesystem failures surface as `Io`. Duplicate ids resolve through
    /// upsert, last entry wins.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(&path)?;

        let snapshot: Snapshot = serde_json::from_str(&data)
            .map_err(|e| Error::CorruptStore(format!("Snapshot parse error: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::CorruptStore(format!(
                "Unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut store = Self::new(snapshot.dimension);
        for record in snapshot.records {
            if record.embedding.len() != snapshot.dimension {
                return Err(Error::CorruptStore(format!(
                    "Record {} has dimension {}, snapshot declares {}",
                    record.id,
                    record.embedding.len(),
                    snapshot.dimension
                )));
            }
            store.upsert(record)?;
        }

        tracing::info!(
            cases = store.len(),
            dim = store.dim,
            path = %path.as_ref().display(),
            "Loaded case store snapshot"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_assist_core::Outcome;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, embedding: Vec<f32>) -> CaseRecord {
        CaseRecord::new(
            id,
            format!("text for {}", id),
            embedding,
            Outcome::Resolved,
            "billing",
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_upsert_rejects_wrong_dimension() {
        let mut store = CaseStore::new(3);
        let err = store.upsert(record("a", vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_upsert_is_idempotent_and_keeps_order() {
        let mut store = CaseStore::new(2);
        store.upsert(record("a", vec![1.0, 0.0])).unwrap();
        store.upsert(record("b", vec![0.0, 1.0])).unwrap();
        store.upsert(record("a", vec![0.5, 0.5])).unwrap();

        assert_eq!(store.len(), 2);
        let ids: Vec<&str> = store.all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap().embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = CaseStore::new(2);
        assert!(matches!(store.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = CaseStore::new(2);
        store.upsert(record("a", vec![1.0, 0.0])).unwrap();
        store.upsert(record("b", vec![0.0, 1.0])).unwrap();
        store.save(&path).unwrap();

        let loaded = CaseStore::load(&path).unwrap();
        assert_eq!(loaded.dim(), 2);
        assert_eq!(loaded.len(), 2);

        let mut original: Vec<&str> = store.all().iter().map(|r| r.id.as_str()).collect();
        let mut restored: Vec<&str> = loaded.all().iter().map(|r| r.id.as_str()).collect();
        original.sort_unstable();
        restored.sort_unstable();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not a snapshot").unwrap();

        assert!(matches!(
            CaseStore::load(&path),
            Err(Error::CorruptStore(_))
        ));
    }

    #[test]
    fn test_load_rejects_dimension_disagreement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = CaseStore::new(2);
        store.upsert(record("a", vec![1.0, 0.0])).unwrap();
        store.save(&path).unwrap();

        // Tamper with the declared dimension only
        let data = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, data.replace("\"dimension\":2", "\"dimension\":3")).unwrap();

        assert!(matches!(
            CaseStore::load(&path),
            Err(Error::CorruptStore(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(CaseStore::load(&path), Err(Error::Io(_))));
    }
}
