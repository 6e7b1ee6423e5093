use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur anywhere in the retrieval system.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or hazardous.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The index was used before `create` or a successful `load`.
    #[error("Index not initialized: {0}")]
    NotInitialized(String),

    /// A vector did not have the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was created with.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// Vectors and passages passed to `add` had different lengths.
    #[error("Arity mismatch: {vectors} vectors for {passages} passages")]
    ArityMismatch {
        /// Number of vectors supplied.
        vectors: usize,
        /// Number of passages supplied.
        passages: usize,
    },

    /// Persisted index artifacts exist but cannot be decoded.
    #[error("Persisted index is corrupt: {0}")]
    PersistenceCorrupt(String),

    /// The embedding provider failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The answer generator failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// No index is available to answer queries.
    #[error("Vector index not found. Add documents and run `quarry ingest` first.")]
    IndexUnavailable,

    /// No answer generator could be constructed.
    #[error("Answer generator is not configured. Check the generation API key.")]
    GeneratorUnavailable,

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}
