//! Exact brute-force inner-product index.

use std::cmp::Ordering;

use bincode::config::standard as bincode_config;
use bincode::{Decode, Encode, decode_from_slice, encode_into_std_write};
use quarry_core::{Embedding, Error, Result};

use super::SimilarityIndex;

/// Leading record of the vector artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
struct VectorHeader {
    /// Format version identifier
    version: u32,
    /// Vector dimension
    dimension: u64,
    /// Number of vectors that follow
    count: u64,
}

impl VectorHeader {
    /// Artifact format version
    const VERSION: u32 = 1;
}

/// Flat row-major vector storage scored by exhaustive inner product.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    /// Vector dimension
    dimension: usize,
    /// `len * dimension` values, one row per vector
    data: Vec<f32>,
}

/// Raw inner product.
fn dot(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(lhs, rhs)| lhs * rhs).sum()
}

/// Best-first ordering: higher score, then lower id.
fn rank(first: &(usize, f32), second: &(usize, f32)) -> Ordering {
    second
        .1
        .total_cmp(&first.1)
        .then_with(|| first.0.cmp(&second.0))
}

impl SimilarityIndex for FlatIndex {
    fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::default(),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn add(&mut self, vectors: &[Embedding]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|vector| vector.len() != self.dimension) {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Vec<(usize, f32)> {
        if top_k == 0 || self.dimension == 0 || query.len() != self.dimension {
            return Vec::default();
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| (id, dot(query, row)))
            .collect();

        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k, rank);
            scored.truncate(top_k);
        }
        scored.sort_by(rank);
        scored
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let header = VectorHeader {
            version: VectorHeader::VERSION,
            dimension: self.dimension as u64,
            count: self.len() as u64,
        };
        let mut bytes = Vec::with_capacity(self.data.len() * 4 + 32);
        encode_into_std_write(header, &mut bytes, bincode_config())
            .and_then(|_| encode_into_std_write(&self.data, &mut bytes, bincode_config()))
            .map_err(|error| Error::Other(format!("Failed to serialize vectors: {error}")))?;
        Ok(bytes)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let (header, header_len): (VectorHeader, usize) =
            decode_from_slice(bytes, bincode_config()).map_err(|error| {
                Error::PersistenceCorrupt(format!("Unreadable vector header: {error}"))
            })?;

        if header.version != VectorHeader::VERSION {
            return Err(Error::PersistenceCorrupt(format!(
                "Unsupported vector format version {}",
                header.version
            )));
        }

        let dimension = usize::try_from(header.dimension)
            .map_err(|_| Error::PersistenceCorrupt("Dimension out of range".to_owned()))?;
        if dimension == 0 {
            return Err(Error::PersistenceCorrupt("Zero vector dimension".to_owned()));
        }

        // f32 values are fixed-width, so the body must hold at least this many bytes.
        let expected_values = usize::try_from(header.count)
            .ok()
            .and_then(|count| count.checked_mul(dimension))
            .ok_or_else(|| Error::PersistenceCorrupt("Vector count out of range".to_owned()))?;
        let body = &bytes[header_len..];
        if expected_values.checked_mul(4).is_none_or(|needed| needed > body.len()) {
            return Err(Error::PersistenceCorrupt(format!(
                "Vector data truncated: expected {expected_values} values"
            )));
        }

        // The length prefix comes from the file; bincode preallocates from it.
        let (declared, _): (u64, usize) = decode_from_slice(body, bincode_config())
            .map_err(|error| Error::PersistenceCorrupt(format!("Unreadable vectors: {error}")))?;
        if usize::try_from(declared).ok() != Some(expected_values) {
            return Err(Error::PersistenceCorrupt(format!(
                "Vector data declares {declared} values, header declares {expected_values}"
            )));
        }

        let (data, _): (Vec<f32>, usize) = decode_from_slice(body, bincode_config())
            .map_err(|error| Error::PersistenceCorrupt(format!("Unreadable vectors: {error}")))?;

        Ok(Self { dimension, data })
    }
}
