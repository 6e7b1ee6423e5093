//! Core types and traits for the quarry retrieval system.
//!
//! This crate provides the error taxonomy, the passage and embedding data model,
//! the collaborator traits (embedding and answer generation) and configuration
//! shared by the rest of the workspace.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Test allows"
    )
)]

/// Workspace configuration loaded from TOML and the environment.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Synchronization helpers for poisoned locks.
pub mod sync;
/// Collaborator traits for embedding and answer generation.
pub mod traits;
/// Passage and embedding data types.
pub mod types;

pub use config::{
    ChunkingConfig, EmbeddingConfig, GenerationConfig, IndexConfig, IngestConfig, QuarryConfig,
    RetrievalConfig,
};
pub use error::{Error, Result};
pub use sync::{IgnoreLock, IgnorePoison};
pub use traits::{AnswerGenerator, EmbeddingProvider};
pub use types::{Embedding, Passage, l2_normalize};
