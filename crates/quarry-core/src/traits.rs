use std::future::Future;

use async_trait::async_trait;

use crate::{Embedding, Result};

/// Trait for mapping text to fixed-dimension, L2-normalized vectors.
///
/// Implementations own any model-specific input prefixing.
pub trait EmbeddingProvider: Send + Sync {
    /// Dimension of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a user question for search.
    ///
    /// # Errors
    /// Returns an error if embedding generation fails
    fn embed_query(&self, text: &str) -> impl Future<Output = Result<Embedding>> + Send;

    /// Embed a batch of passages for indexing, preserving input order.
    ///
    /// # Errors
    /// Returns an error if any embedding generation fails
    fn embed_passages(
        &self,
        texts: Vec<String>,
    ) -> impl Future<Output = Result<Vec<Embedding>>> + Send;
}

/// Trait for language models that answer a question from assembled context.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Returns the unique identifier for this generator.
    fn name(&self) -> &'static str;

    /// Generates an answer to `question` grounded in `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    async fn generate_answer(&self, context: &str, question: &str) -> Result<String>;
}
