//! Configuration types for chunking, indexing, embedding, generation and ingestion.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Characters per token used by the chunking approximation.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quarry.toml";

/// Env var key for the Gemini API key.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Env var key for the Ollama host.
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
/// Env var key for the embedding model.
pub const ENV_EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";

/// Complete workspace configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    /// Passage chunking parameters
    pub chunking: ChunkingConfig,
    /// Index location and shape
    pub index: IndexConfig,
    /// Embedding provider settings
    pub embedding: EmbeddingConfig,
    /// Answer generator settings
    pub generation: GenerationConfig,
    /// Query-time retrieval settings
    pub retrieval: RetrievalConfig,
    /// Document ingestion settings
    pub ingest: IngestConfig,
}

/// Passage chunking parameters, in approximate tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target passage size in tokens
    pub chunk_size_tokens: usize,
    /// Overlap between consecutive passages in tokens
    pub overlap_tokens: usize,
    /// Buffer size in characters that triggers a streaming flush
    pub flush_threshold_chars: Option<usize>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_tokens: 600,
            overlap_tokens: 100,
            flush_threshold_chars: None,
        }
    }
}

impl ChunkingConfig {
    /// Create a chunking config with the default flush threshold.
    pub fn new(chunk_size_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            chunk_size_tokens,
            overlap_tokens,
            flush_threshold_chars: None,
        }
    }

    /// Sets an explicit streaming flush threshold.
    #[must_use]
    pub fn with_flush_threshold(mut self, chars: usize) -> Self {
        self.flush_threshold_chars = Some(chars);
        self
    }

    /// Passage window in characters.
    pub fn chunk_chars(&self) -> usize {
        self.chunk_size_tokens * CHARS_PER_TOKEN
    }

    /// Overlap window in characters.
    pub fn overlap_chars(&self) -> usize {
        self.overlap_tokens * CHARS_PER_TOKEN
    }

    /// Streaming flush threshold in characters (defaults to eight windows).
    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold_chars
            .unwrap_or_else(|| self.chunk_chars() * 8)
    }

    /// Check for hazardous combinations.
    ///
    /// Hazards are accepted by the chunker, which degrades instead of failing,
    /// so callers usually log the error rather than abort.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first hazard found
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_tokens == 0 {
            return Err(Error::Config(
                "chunk_size_tokens is 0; passages fall back to single characters".to_owned(),
            ));
        }
        if self.overlap_tokens >= self.chunk_size_tokens {
            return Err(Error::Config(format!(
                "overlap_tokens ({}) >= chunk_size_tokens ({}); overlap degrades to zero",
                self.overlap_tokens, self.chunk_size_tokens
            )));
        }
        if self.flush_threshold() <= self.overlap_chars() {
            return Err(Error::Config(format!(
                "flush_threshold_chars ({}) <= overlap ({} chars); cross-flush overlap is lost",
                self.flush_threshold(),
                self.overlap_chars()
            )));
        }
        Ok(())
    }
}

/// Location and shape of the persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding both index artifacts
    pub directory: PathBuf,
    /// File name of the binary vector artifact
    pub vector_file: String,
    /// File name of the passage metadata artifact
    pub metadata_file: String,
    /// Embedding dimension for newly created indexes
    pub dimension: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("index"),
            vector_file: "vectors.bin".to_owned(),
            metadata_file: "metadata.json".to_owned(),
            dimension: 768,
        }
    }
}

impl IndexConfig {
    /// Full path of the vector artifact.
    pub fn vector_path(&self) -> PathBuf {
        self.directory.join(&self.vector_file)
    }

    /// Full path of the metadata artifact.
    pub fn metadata_path(&self) -> PathBuf {
        self.directory.join(&self.metadata_file)
    }
}

/// Embedding provider settings (Ollama).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama host URL without port
    pub host: String,
    /// Ollama port
    pub port: u16,
    /// Embedding model name
    pub model: String,
    /// Prefix prepended to questions before embedding
    pub query_prefix: String,
    /// Prefix prepended to passages before embedding
    pub passage_prefix: String,
    /// Passages per embedding request during ingestion
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_owned(),
            port: 11434,
            model: "nomic-embed-text".to_owned(),
            query_prefix: "search_query: ".to_owned(),
            passage_prefix: "search_document: ".to_owned(),
            batch_size: 32,
        }
    }
}

/// Answer generator settings (Gemini).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier
    pub model: String,
    /// API key; falls back to `GEMINI_API_KEY`
    pub api_key: Option<String>,
    /// Instructions placed before the context and question
    pub system_prompt: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_owned(),
            api_key: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
        }
    }
}

/// Default instructions for the answer generator.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a patient tutor answering a student's question.

Rules:
- Solve the question step by step using only the provided context
- Write out formulas where they help
- Finish with a line of the form \"Answer: ...\"
- If the context does not cover the question, say that you don't know and omit the \"Answer:\" line
";

/// Query-time retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned for documents
    pub documents_dir: PathBuf,
    /// Bytes read per fragment from text files
    pub read_block_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents"),
            read_block_bytes: 4096,
        }
    }
}

impl QuarryConfig {
    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `quarry.toml` in the working
    /// directory is used when present, otherwise defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(explicit) => Self::load_from_file(explicit)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("Failed to read config {}: {error}", path.display()))
        })?;
        let config: Self = toml::from_str(&contents)?;

        debug!(
            "Loaded config from {:?}: generation api_key={}",
            path,
            if config.generation.api_key.is_some() {
                "present"
            } else {
                "missing"
            }
        );

        Ok(config)
    }

    /// Fill settings from environment-style lookups.
    ///
    /// The API key only fills an empty slot; host and model always override.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.generation.api_key.is_none() {
            self.generation.api_key = lookup(ENV_GEMINI_API_KEY).filter(|key| !key.is_empty());
        }
        if let Some(host) = lookup(ENV_OLLAMA_HOST) {
            self.embedding.host = host;
        }
        if let Some(model) = lookup(ENV_EMBEDDING_MODEL) {
            self.embedding.model = model;
        }
    }

    /// Render the effective configuration as TOML with secrets redacted.
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.generation.api_key.is_some() {
            redacted.generation.api_key = Some("<redacted>".to_owned());
        }
        toml::to_string_pretty(&redacted)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))
    }
}
