//! Retrieval substrate: chunking, vector indexing, ingestion and question answering.
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::float_cmp,
        reason = "Test allows"
    )
)]

/// Whole-string and streaming passage chunking
pub mod chunking;
pub mod embedding;
/// Exact vector index with paired persistence
pub mod index;
pub mod ingest;
pub mod pipeline;

pub use chunking::{StreamingAssembler, chunk_text, estimate_tokens};
pub use embedding::OllamaEmbedder;
pub use index::{FlatIndex, IndexStats, SearchHit, SimilarityIndex, VectorStore};
pub use ingest::{IngestReport, Ingestor, ingest_directory};
pub use pipeline::{Answer, AnswerOutcome, RetrievalPipeline, RetrievedContext, assemble_context};
