//! Question answering over the vector index.
//!
//! A query moves through `Embedding -> Searching -> ContextAssembly ->
//! Generating`, exiting early with a fixed answer when nothing is retrieved.

use std::sync::{Arc, RwLock};

use quarry_core::{
    AnswerGenerator, EmbeddingProvider, Error, IgnorePoison as _, IndexConfig, Result,
};
use tracing::{debug, info, warn};

use crate::index::{SearchHit, VectorStore};

/// Answer returned when retrieval finds nothing.
pub const NO_RESULTS_ANSWER: &str = "No relevant documents found.";

/// Stage of a single query, reported at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    /// Embedding the question
    Embedding,
    /// Searching the index
    Searching,
    /// Concatenating retrieved passages
    ContextAssembly,
    /// Waiting on the answer generator
    Generating,
    /// Finished
    Done,
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The generator answered from retrieved context
    Generated,
    /// Nothing relevant was retrieved
    NoResults,
    /// The generator failed; the text describes the failure
    GenerationFailed,
}

/// Answer to a question with the documents it drew on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Answer text
    pub text: String,
    /// Distinct sources of the retrieved passages, most relevant first
    pub sources: Vec<String>,
    /// How the answer was produced
    pub outcome: AnswerOutcome,
}

/// Grounding context assembled from search hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievedContext {
    /// Concatenated passages with source headers
    pub text: String,
    /// Distinct sources in first-seen order
    pub sources: Vec<String>,
}

/// Concatenate hits, best first, as `--- Source: {source} ---` blocks.
pub fn assemble_context(hits: &[SearchHit]) -> RetrievedContext {
    let mut context = RetrievedContext::default();
    for hit in hits {
        context.text.push_str(&format!(
            "--- Source: {} ---\n{}\n\n",
            hit.passage.source, hit.passage.content
        ));
        if !context.sources.contains(&hit.passage.source) {
            context.sources.push(hit.passage.source.clone());
        }
    }
    context
}

/// Embeds questions, searches the shared index and asks the generator.
pub struct RetrievalPipeline<E: EmbeddingProvider> {
    embedder: Arc<E>,
    store: Arc<RwLock<VectorStore>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    index: IndexConfig,
    top_k: usize,
}

impl<E: EmbeddingProvider> RetrievalPipeline<E> {
    /// Create a pipeline over a shared store.
    pub fn new(
        embedder: Arc<E>,
        store: Arc<RwLock<VectorStore>>,
        generator: Option<Arc<dyn AnswerGenerator>>,
        index: IndexConfig,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            index,
            top_k,
        }
    }

    /// Passages retrieved per question.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Shared store handle.
    pub fn store(&self) -> &Arc<RwLock<VectorStore>> {
        &self.store
    }

    /// Reload the persisted index into a fresh store and swap it in.
    ///
    /// Returns `Ok(false)` and keeps the current store if no artifacts exist.
    ///
    /// # Errors
    /// Returns an error if the artifacts exist but cannot be read
    pub fn refresh(&self) -> Result<bool> {
        let mut fresh = VectorStore::default();
        if !fresh.load(&self.index.vector_path(), &self.index.metadata_path())? {
            return Ok(false);
        }
        *self.store.write_ignore_poison() = fresh;
        info!("Index refreshed from {}", self.index.directory.display());
        Ok(true)
    }

    /// Make sure a searchable index is loaded, reloading once if needed.
    ///
    /// # Errors
    /// Returns `IndexUnavailable` if no populated index can be loaded
    pub fn ensure_index(&self) -> Result<()> {
        if self.store.read_ignore_poison().is_ready() {
            return Ok(());
        }
        warn!("Index not loaded, attempting to reload");
        match self.refresh() {
            Ok(true) if self.store.read_ignore_poison().is_ready() => Ok(()),
            Ok(_) => Err(Error::IndexUnavailable),
            Err(error) => {
                warn!("Index reload failed: {error}");
                Err(Error::IndexUnavailable)
            }
        }
    }

    /// Embed `question` and return the `top_k` most similar passages.
    ///
    /// # Errors
    /// Returns `IndexUnavailable` if there is no index, or the embedding error
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.ensure_index()?;

        debug!("Query stage: {:?}", QueryStage::Embedding);
        let query = self.embedder.embed_query(question).await?;

        debug!("Query stage: {:?}", QueryStage::Searching);
        let hits = self.store.read_ignore_poison().search(&query, top_k)?;
        debug!("Retrieved {} passages", hits.len());
        Ok(hits)
    }

    /// Answer `question` from the indexed documents.
    ///
    /// Generator failures are reported in the answer text rather than as errors.
    ///
    /// # Errors
    /// Returns `GeneratorUnavailable` without a generator, `IndexUnavailable`
    /// without an index, or the embedding error
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let Some(generator) = self.generator.as_ref() else {
            return Err(Error::GeneratorUnavailable);
        };

        let hits = self.retrieve(question, self.top_k).await?;
        if hits.is_empty() {
            debug!("Query stage: {:?}", QueryStage::Done);
            return Ok(Answer {
                text: NO_RESULTS_ANSWER.to_owned(),
                sources: Vec::default(),
                outcome: AnswerOutcome::NoResults,
            });
        }

        debug!("Query stage: {:?}", QueryStage::ContextAssembly);
        let context = assemble_context(&hits);

        debug!("Query stage: {:?}", QueryStage::Generating);
        let (text, outcome) = match generator.generate_answer(&context.text, question).await {
            Ok(text) => (text, AnswerOutcome::Generated),
            Err(error) => {
                warn!("Generator {} failed: {error}", generator.name());
                (
                    format!("An error occurred while generating the answer: {error}"),
                    AnswerOutcome::GenerationFailed,
                )
            }
        };

        debug!("Query stage: {:?}", QueryStage::Done);
        Ok(Answer {
            text,
            sources: context.sources,
            outcome,
        })
    }
}
