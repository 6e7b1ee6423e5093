//! Vector index with passage metadata and paired on-disk persistence.

mod flat;
mod persist;
mod store;

pub use flat::FlatIndex;
pub use store::{IndexStats, SearchHit, VectorStore};

use quarry_core::{Embedding, Result};

/// Similarity structure over fixed-dimension vectors.
///
/// Ids are 0-based insertion positions. Implementations only score vectors;
/// metadata lives in [`VectorStore`]. The flat index is exact; an approximate
/// structure can implement this trait without changing `VectorStore` callers.
pub trait SimilarityIndex: Send + Sync {
    /// Create an empty index of `dimension`.
    fn with_dimension(dimension: usize) -> Self
    where
        Self: Sized;

    /// Vector dimension.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether no vectors are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors in order.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` without appending anything if any vector has
    /// the wrong length
    fn add(&mut self, vectors: &[Embedding]) -> Result<()>;

    /// Highest-scoring `(id, inner product)` pairs, best first, ties by lower id.
    fn search(&self, query: &[f32], top_k: usize) -> Vec<(usize, f32)>;

    /// Serialize the vector structure.
    ///
    /// # Errors
    /// Returns an error if encoding fails
    fn encode(&self) -> Result<Vec<u8>>;

    /// Deserialize a vector structure written by [`encode`](Self::encode).
    ///
    /// # Errors
    /// Returns `PersistenceCorrupt` if the bytes are not a valid structure
    fn decode(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}
