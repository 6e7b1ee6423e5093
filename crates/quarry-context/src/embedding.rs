//! Passage and query embeddings using Ollama.

use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::GenerateEmbeddingsRequest;
use quarry_core::{Embedding, EmbeddingConfig, EmbeddingProvider, Error, Result, l2_normalize};
use tokio::process::Command;
use tracing::info;

/// Ollama embedding client
///
/// Applies the configured query/passage prefixes (e5-style models expect
/// them) and returns L2-normalized vectors of a fixed dimension.
pub struct OllamaEmbedder {
    ollama: Ollama,
    model: String,
    query_prefix: String,
    passage_prefix: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Create a client for `config`, expecting vectors of `dimension`.
    pub fn new(config: &EmbeddingConfig, dimension: usize) -> Self {
        Self {
            ollama: Ollama::new(config.host.clone(), config.port),
            model: config.model.clone(),
            query_prefix: config.query_prefix.clone(),
            passage_prefix: config.passage_prefix.clone(),
            dimension,
        }
    }

    /// Embedding model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ensure the embedding model is available, pulling it if needed
    ///
    /// # Errors
    /// Returns an error if Ollama is unreachable or the model cannot be pulled
    pub async fn ensure_model_available(&self) -> Result<()> {
        let models = self.ollama.list_local_models().await.map_err(|error| {
            Error::Embedding(format!(
                "Failed to connect to Ollama: {error}.\n\nPlease ensure Ollama is installed and running:\n  - Install from: https://ollama.ai\n  - Start with: ollama serve"
            ))
        })?;

        if models.iter().any(|model| model.name.contains(&self.model)) {
            return Ok(());
        }

        info!("Embedding model '{}' not found", self.model);
        info!("Pulling model from Ollama (this may take a few minutes)...");
        info!("    Running: ollama pull {}", self.model);

        let status = Command::new("ollama")
            .args(["pull", &self.model])
            .status()
            .await
            .map_err(|error| {
                Error::Embedding(format!(
                    "Failed to run 'ollama pull {}': {error}. Is Ollama installed?",
                    self.model
                ))
            })?;

        if !status.success() {
            return Err(Error::Embedding(format!(
                "Failed to pull model '{}'. Check Ollama is running.",
                self.model
            )));
        }

        info!("Successfully pulled embedding model '{}'", self.model);
        Ok(())
    }

    /// Send one batch request and normalize the result.
    async fn request(&self, inputs: Vec<String>) -> Result<Vec<Embedding>> {
        let expected = inputs.len();
        let request = GenerateEmbeddingsRequest::new(self.model.clone(), inputs.into());

        let response = self
            .ollama
            .generate_embeddings(request)
            .await
            .map_err(|error| {
                let error_str = format!("{error:?}");
                if error_str.contains("model") && error_str.contains("not found") {
                    Error::Embedding(format!(
                        "Embedding model '{}' not found. Run: ollama pull {}",
                        self.model, self.model
                    ))
                } else {
                    Error::Embedding(format!("Embedding generation failed: {error}"))
                }
            })?;

        finalize_embeddings(response.embeddings, expected, self.dimension)
    }
}

/// Check the count and dimension of a response and normalize each vector.
fn finalize_embeddings(
    mut embeddings: Vec<Embedding>,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Embedding>> {
    if embeddings.len() != expected {
        return Err(Error::Embedding(format!(
            "Expected {expected} embeddings, got {}",
            embeddings.len()
        )));
    }
    if let Some(bad) = embeddings.iter().find(|vector| vector.len() != dimension) {
        return Err(Error::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    for vector in &mut embeddings {
        l2_normalize(vector);
    }
    Ok(embeddings)
}

impl EmbeddingProvider for OllamaEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.request(vec![format!("{}{text}", self.query_prefix)])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding("No embeddings returned".to_owned()))
    }

    async fn embed_passages(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::default());
        }
        let prefixed = texts
            .into_iter()
            .map(|text| format!("{}{text}", self.passage_prefix))
            .collect();
        self.request(prefixed).await
    }
}
