use serde::{Deserialize, Serialize};

/// Fixed-dimension embedding vector.
pub type Embedding = Vec<f32>;

/// A bounded span of source text with provenance.
///
/// Field order is part of the persisted metadata format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passage {
    /// Trimmed, non-empty slice of the source document text.
    pub content: String,
    /// Originating document (file name or logical id).
    pub source: String,
}

impl Passage {
    /// Create a new passage.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// Scale `vector` to unit L2 length in place.
///
/// Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}
