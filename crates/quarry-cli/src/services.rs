//! Lazily constructed collaborators shared by the command handlers.

use std::sync::{Arc, OnceLock, RwLock};

use quarry_context::{OllamaEmbedder, RetrievalPipeline, VectorStore};
use quarry_core::{AnswerGenerator, QuarryConfig};
use quarry_providers::GeminiGenerator;
use tracing::warn;

/// Cached factory: each collaborator is built on first use and reused.
pub struct Services {
    config: QuarryConfig,
    embedder: OnceLock<Arc<OllamaEmbedder>>,
    store: OnceLock<Arc<RwLock<VectorStore>>>,
    generator: OnceLock<Option<Arc<dyn AnswerGenerator>>>,
}

impl Services {
    /// Wrap `config`; nothing is built until first use.
    pub fn new(config: QuarryConfig) -> Self {
        Self {
            config,
            embedder: OnceLock::new(),
            store: OnceLock::new(),
            generator: OnceLock::new(),
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Shared Ollama embedder.
    pub fn embedder(&self) -> Arc<OllamaEmbedder> {
        Arc::clone(self.embedder.get_or_init(|| {
            Arc::new(OllamaEmbedder::new(
                &self.config.embedding,
                self.config.index.dimension,
            ))
        }))
    }

    /// Shared store, loaded from disk on first use.
    ///
    /// Missing or unreadable artifacts leave an empty store; the pipeline
    /// retries the load once when a query arrives.
    pub fn store(&self) -> Arc<RwLock<VectorStore>> {
        Arc::clone(self.store.get_or_init(|| {
            let mut store = VectorStore::default();
            let index = &self.config.index;
            if let Err(error) = store.load(&index.vector_path(), &index.metadata_path()) {
                warn!("Failed to load index: {error}");
            }
            Arc::new(RwLock::new(store))
        }))
    }

    /// Answer generator, or `None` if it cannot be configured.
    pub fn generator(&self) -> Option<Arc<dyn AnswerGenerator>> {
        self.generator
            .get_or_init(
                || match GeminiGenerator::from_config(&self.config.generation) {
                    Ok(generator) => Some(Arc::new(generator) as Arc<dyn AnswerGenerator>),
                    Err(error) => {
                        warn!("Answer generator unavailable: {error}");
                        None
                    }
                },
            )
            .clone()
    }

    /// Pipeline over the shared collaborators, with `top_k` defaulting to the config.
    pub fn pipeline(&self, top_k: Option<usize>) -> RetrievalPipeline<OllamaEmbedder> {
        RetrievalPipeline::new(
            self.embedder(),
            self.store(),
            self.generator(),
            self.config.index.clone(),
            top_k.unwrap_or(self.config.retrieval.top_k),
        )
    }
}
