//! Offline collaborators shared by the integration tests.

use quarry_core::{Embedding, EmbeddingProvider, Result, l2_normalize};

/// Bag-of-words embedder hashing each lowercase word into one bucket.
pub struct WordHashEmbedder {
    pub dimension: usize,
}

impl WordHashEmbedder {
    pub fn vector(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0; self.dimension];
        for word in text.split(|letter: char| !letter.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let bucket = word.to_lowercase().bytes().fold(5381usize, |hash, byte| {
                hash.wrapping_mul(33) ^ usize::from(byte)
            });
            vector[bucket % self.dimension] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingProvider for WordHashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        Ok(self.vector(text))
    }

    async fn embed_passages(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }
}
