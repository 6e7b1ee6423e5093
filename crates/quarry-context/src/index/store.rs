//! Index lifecycle: create, append, search, save and load.

use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::Path;

use quarry_core::{Embedding, Error, Passage, Result};
use tracing::{info, warn};

use super::persist::{MetadataArtifact, ensure_parent_dir, write_replacing};
use super::{FlatIndex, SimilarityIndex};

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Insertion id of the record
    pub id: usize,
    /// Stored passage
    pub passage: Passage,
    /// Raw inner product with the query
    pub score: f32,
}

/// Summary of the records held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of records
    pub records: usize,
    /// Vector dimension
    pub dimension: usize,
    /// Distinct passage sources
    pub sources: usize,
}

/// Vector index paired with the passage metadata of each record.
///
/// Record `i` is the `i`-th vector of the similarity index together with
/// `passages[i]`; both only grow, in lockstep. The store holds no internal
/// lock: `search` takes `&self` and may run from many readers at once, while
/// `add` and `load` need exclusive access.
#[derive(Debug)]
pub struct VectorStore<I: SimilarityIndex = FlatIndex> {
    /// Similarity structure, absent until `create` or `load`
    index: Option<I>,
    /// Passage metadata in id order
    passages: Vec<Passage>,
}

impl<I: SimilarityIndex> Default for VectorStore<I> {
    fn default() -> Self {
        Self {
            index: None,
            passages: Vec::default(),
        }
    }
}

impl<I: SimilarityIndex> VectorStore<I> {
    /// Reset to an empty index of `dimension`.
    ///
    /// # Errors
    /// Returns `Error::Config` if `dimension` is zero
    pub fn create(&mut self, dimension: usize) -> Result<()> {
        if dimension == 0 {
            return Err(Error::Config("index dimension must be positive".to_owned()));
        }
        self.index = Some(I::with_dimension(dimension));
        self.passages.clear();
        Ok(())
    }

    /// Dimension of the current index, if one exists.
    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(SimilarityIndex::dimension)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Whether an index exists and holds at least one record.
    pub fn is_ready(&self) -> bool {
        self.index.is_some() && !self.passages.is_empty()
    }

    /// Stored passages in id order.
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Record counts for reporting.
    pub fn stats(&self) -> Option<IndexStats> {
        let index = self.index.as_ref()?;
        let sources: BTreeSet<&str> = self
            .passages
            .iter()
            .map(|passage| passage.source.as_str())
            .collect();
        Some(IndexStats {
            records: self.passages.len(),
            dimension: index.dimension(),
            sources: sources.len(),
        })
    }

    /// Append `vectors` and their `passages`, returning the assigned ids.
    ///
    /// Either every record is appended or none is.
    ///
    /// # Errors
    /// Returns `NotInitialized` before `create`/`load`, `ArityMismatch` if the
    /// lengths differ, and `DimensionMismatch` if any vector has the wrong length
    pub fn add(&mut self, vectors: Vec<Embedding>, passages: Vec<Passage>) -> Result<Range<usize>> {
        let Some(index) = self.index.as_mut() else {
            return Err(Error::NotInitialized(
                "call create or load before adding records".to_owned(),
            ));
        };
        if vectors.len() != passages.len() {
            return Err(Error::ArityMismatch {
                vectors: vectors.len(),
                passages: passages.len(),
            });
        }
        let dimension = index.dimension();
        if let Some(bad) = vectors.iter().find(|vector| vector.len() != dimension) {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        index.add(&vectors)?;
        let first = self.passages.len();
        self.passages.extend(passages);
        Ok(first..self.passages.len())
    }

    /// The `top_k` records most similar to `query`, best first.
    ///
    /// # Errors
    /// Returns `NotInitialized` if there is no index or no records, and
    /// `DimensionMismatch` if the query has the wrong length
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            return Err(Error::NotInitialized("index holds no records".to_owned()));
        };
        if query.len() != index.dimension() {
            return Err(Error::DimensionMismatch {
                expected: index.dimension(),
                actual: query.len(),
            });
        }

        Ok(index
            .search(query, top_k)
            .into_iter()
            .filter_map(|(id, score)| {
                self.passages.get(id).map(|passage| SearchHit {
                    id,
                    passage: passage.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Persist the vector structure and metadata as a pair.
    ///
    /// # Errors
    /// Returns `NotInitialized` if there is no index, or an error if writing fails
    pub fn save(&self, vector_path: &Path, metadata_path: &Path) -> Result<()> {
        let Some(index) = self.index.as_ref() else {
            return Err(Error::NotInitialized("no index to save".to_owned()));
        };

        ensure_parent_dir(vector_path)?;
        ensure_parent_dir(metadata_path)?;

        let vector_bytes = index.encode()?;
        let metadata_bytes = MetadataArtifact::encode(&self.passages)?;
        write_replacing(vector_path, &vector_bytes)?;
        write_replacing(metadata_path, &metadata_bytes)?;

        info!(
            "Index saved to {} ({} records, {} bytes)",
            vector_path.display(),
            self.passages.len(),
            vector_bytes.len()
        );
        info!("Metadata saved to {}", metadata_path.display());
        Ok(())
    }

    /// Replace the in-memory state with the persisted pair.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when either artifact
    /// is missing.
    ///
    /// # Errors
    /// Returns `PersistenceCorrupt` if the artifacts cannot be decoded or do
    /// not describe the same records, or an I/O error if reading fails
    pub fn load(&mut self, vector_path: &Path, metadata_path: &Path) -> Result<bool> {
        if !vector_path.exists() || !metadata_path.exists() {
            warn!(
                "Index or metadata file not found ({}, {})",
                vector_path.display(),
                metadata_path.display()
            );
            return Ok(false);
        }

        let index = I::decode(&fs::read(vector_path)?)?;
        let passages = MetadataArtifact::decode(&fs::read(metadata_path)?)?;
        if index.len() != passages.len() {
            return Err(Error::PersistenceCorrupt(format!(
                "{} vectors but {} metadata records",
                index.len(),
                passages.len()
            )));
        }

        info!(
            "Loaded index from {} ({} records, dimension {})",
            vector_path.display(),
            passages.len(),
            index.dimension()
        );
        self.index = Some(index);
        self.passages = passages;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::IgnorePoison as _;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};
    use std::thread;
    use tempfile::TempDir;

    fn artifact_paths(temp: &TempDir) -> (PathBuf, PathBuf) {
        let directory = temp.path().join("index");
        (directory.join("vectors.bin"), directory.join("metadata.json"))
    }

    fn sample_store() -> VectorStore {
        let mut store = VectorStore::default();
        store.create(4).unwrap();
        store
            .add(
                vec![
                    vec![1.0, 0.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0, 0.0],
                    vec![0.6, 0.8, 0.0, 0.0],
                ],
                vec![
                    Passage::new("alpha", "doc1"),
                    Passage::new("beta", "doc2"),
                    Passage::new("gamma", "doc1"),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_single_record_scenario() {
        let mut store: VectorStore = VectorStore::default();
        store.create(4).unwrap();
        let ids = store
            .add(vec![vec![1.0, 0.0, 0.0, 0.0]], vec![Passage::new("alpha", "doc1")])
            .unwrap();
        assert_eq!(ids, 0..1);

        let hits = store.search(&[1.0, 0.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(
            hits,
            vec![SearchHit {
                id: 0,
                passage: Passage::new("alpha", "doc1"),
                score: 1.0,
            }]
        );
    }

    #[test]
    fn test_ids_are_contiguous_across_batches() {
        let mut store = sample_store();
        let ids = store
            .add(
                vec![vec![0.0, 0.0, 1.0, 0.0], vec![0.0, 0.0, 0.0, 1.0]],
                vec![Passage::new("delta", "doc3"), Passage::new("epsilon", "doc3")],
            )
            .unwrap();
        assert_eq!(ids, 3..5);
        assert_eq!(store.len(), 5);

        let hits = store.search(&[0.0, 0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].id, 4);
        assert_eq!(hits[0].passage.content, "epsilon");
    }

    #[test]
    fn test_top_k_larger_than_store_returns_all_sorted() {
        let mut store: VectorStore = VectorStore::default();
        store.create(2).unwrap();
        store
            .add(
                vec![vec![0.2, 0.0], vec![0.9, 0.0]],
                vec![Passage::new("low", "a"), Passage::new("high", "b")],
            )
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.content, "high");
        assert_eq!(hits[1].passage.content, "low");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_arity_mismatch_leaves_store_unchanged() {
        let mut store = sample_store();
        let result = store.add(
            vec![vec![1.0, 0.0, 0.0, 0.0]; 3],
            vec![Passage::new("x", "d"), Passage::new("y", "d")],
        );
        assert!(matches!(
            result,
            Err(Error::ArityMismatch {
                vectors: 3,
                passages: 2
            })
        ));
        assert_eq!(store.len(), 3);
        assert_eq!(store.search(&[1.0, 0.0, 0.0, 0.0], 10).unwrap().len(), 3);
    }

    #[test]
    fn test_dimension_mismatch_leaves_store_unchanged() {
        let mut store = sample_store();
        let result = store.add(
            vec![vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0]],
            vec![Passage::new("x", "d"), Passage::new("y", "d")],
        );
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 2
            })
        ));
        assert_eq!(store.len(), 3);

        assert!(matches!(
            store.search(&[1.0, 0.0], 1),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_not_initialized() {
        let mut store: VectorStore = VectorStore::default();
        assert!(matches!(
            store.search(&[1.0], 1),
            Err(Error::NotInitialized(_))
        ));
        assert!(matches!(
            store.add(vec![vec![1.0]], vec![Passage::new("a", "b")]),
            Err(Error::NotInitialized(_))
        ));

        let temp = TempDir::new().expect("Failed to create temp dir");
        let (vectors, metadata) = artifact_paths(&temp);
        assert!(matches!(
            store.save(&vectors, &metadata),
            Err(Error::NotInitialized(_))
        ));

        store.create(3).unwrap();
        assert!(matches!(
            store.search(&[1.0, 0.0, 0.0], 1),
            Err(Error::NotInitialized(_))
        ));
        assert!(!store.is_ready());
        assert!(matches!(store.create(0), Err(Error::Config(_))));
    }

    #[test]
    fn test_create_resets_records() {
        let mut store = sample_store();
        store.create(8).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.dimension(), Some(8));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let (vectors, metadata) = artifact_paths(&temp);
        let store = sample_store();
        store.save(&vectors, &metadata).unwrap();
        assert!(vectors.exists() && metadata.exists());

        let mut restored: VectorStore = VectorStore::default();
        assert!(restored.load(&vectors, &metadata).unwrap());
        assert_eq!(restored.passages(), store.passages());
        assert_eq!(restored.dimension(), Some(4));

        for query in [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.5, 0.5, 0.5, 0.5],
            [-0.3, 0.1, 0.9, 0.0],
        ] {
            assert_eq!(
                restored.search(&query, 3).unwrap(),
                store.search(&query, 3).unwrap()
            );
        }
    }

    #[test]
    fn test_load_reports_missing_pair_without_touching_state() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let (vectors, metadata) = artifact_paths(&temp);

        let mut store = sample_store();
        assert!(!store.load(&vectors, &metadata).unwrap());
        assert_eq!(store.len(), 3);

        sample_store().save(&vectors, &metadata).unwrap();
        fs::remove_file(&metadata).unwrap();

        let mut fresh: VectorStore = VectorStore::default();
        assert!(!fresh.load(&vectors, &metadata).unwrap());
        assert!(fresh.dimension().is_none());
    }

    #[test]
    fn test_load_corrupt_artifacts() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let (vectors, metadata) = artifact_paths(&temp);
        sample_store().save(&vectors, &metadata).unwrap();

        fs::write(&metadata, b"{ not json").unwrap();
        let mut store: VectorStore = VectorStore::default();
        assert!(matches!(
            store.load(&vectors, &metadata),
            Err(Error::PersistenceCorrupt(_))
        ));
        assert!(store.dimension().is_none());

        let fewer = MetadataArtifact::encode(&[Passage::new("only", "one")]).unwrap();
        fs::write(&metadata, fewer).unwrap();
        assert!(matches!(
            store.load(&vectors, &metadata),
            Err(Error::PersistenceCorrupt(_))
        ));

        fs::write(&vectors, b"garbage").unwrap();
        assert!(matches!(
            store.load(&vectors, &metadata),
            Err(Error::PersistenceCorrupt(_))
        ));
    }

    #[test]
    fn test_stats() {
        let store = sample_store();
        assert_eq!(
            store.stats(),
            Some(IndexStats {
                records: 3,
                dimension: 4,
                sources: 2,
            })
        );
        assert!(VectorStore::<FlatIndex>::default().stats().is_none());
    }

    #[test]
    fn test_concurrent_readers_see_identical_rankings() {
        let mut store: VectorStore = VectorStore::default();
        store.create(3).unwrap();
        let vectors: Vec<Embedding> = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.05;
                vec![angle.cos(), angle.sin(), (index % 7) as f32 * 0.1]
            })
            .collect();
        let passages = (0..200)
            .map(|index| Passage::new(format!("passage {index}"), format!("doc{}", index % 5)))
            .collect();
        store.add(vectors, passages).unwrap();

        let query: [f32; 3] = [0.6, 0.8, 0.1];
        let expected = store.search(&query, 10).unwrap();
        assert_eq!(expected.len(), 10);

        let shared = Arc::new(RwLock::new(store));
        let searches = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..8 {
                let reader = Arc::clone(&shared);
                let (expected, searches) = (&expected, &searches);
                scope.spawn(move || {
                    for _ in 0..25 {
                        let hits = reader.read_ignore_poison().search(&query, 10).unwrap();
                        assert_eq!(&hits, expected);
                        searches.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(searches.load(Ordering::SeqCst), 200);
    }
}
