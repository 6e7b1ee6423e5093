//! End-to-end: ingest a documents directory, then answer from the saved index.

use std::fs;
use std::sync::{Arc, RwLock};

use quarry_context::{AnswerOutcome, RetrievalPipeline, VectorStore, ingest_directory};
use quarry_core::{AnswerGenerator, ChunkingConfig, QuarryConfig};
use quarry_providers::MockGenerator;
use tempfile::TempDir;

use crate::support::WordHashEmbedder;

fn workspace() -> (TempDir, QuarryConfig) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut config = QuarryConfig::default();
    config.ingest.documents_dir = temp.path().join("documents");
    config.ingest.read_block_bytes = 64;
    config.index.directory = temp.path().join("index");
    config.index.dimension = 256;
    config.chunking = ChunkingConfig::new(20, 4);
    config.embedding.batch_size = 3;

    fs::create_dir_all(&config.ingest.documents_dir).unwrap();
    fs::write(
        config.ingest.documents_dir.join("thermodynamics.txt"),
        "Entropy measures disorder in a thermodynamic system. \
         The second law says entropy of an isolated system never decreases. \
         Heat flows spontaneously from hot bodies to cold bodies.",
    )
    .unwrap();
    fs::write(
        config.ingest.documents_dir.join("optics.txt"),
        "Refraction bends light when it crosses into a medium with a different index. \
         Snell's law relates the angles of incidence and refraction. \
         Lenses focus light through refraction.",
    )
    .unwrap();
    (temp, config)
}

fn build_pipeline(
    config: &QuarryConfig,
    embedder: Arc<WordHashEmbedder>,
    generator: MockGenerator,
) -> RetrievalPipeline<WordHashEmbedder> {
    RetrievalPipeline::new(
        embedder,
        Arc::new(RwLock::new(VectorStore::default())),
        Some(Arc::new(generator) as Arc<dyn AnswerGenerator>),
        config.index.clone(),
        config.retrieval.top_k,
    )
}

#[tokio::test]
async fn test_ingest_then_ask() {
    let (_temp, config) = workspace();
    let embedder = Arc::new(WordHashEmbedder { dimension: 256 });

    let report = ingest_directory(&config, embedder.as_ref()).await.unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(report.skipped, 0);
    assert!(report.passages >= 4);

    let generator = MockGenerator::new().with_answer("entropy", "Answer: it never decreases");
    let pipeline = build_pipeline(&config, embedder, generator.clone());
    let answer = pipeline
        .ask("Why does entropy of an isolated system never decrease?")
        .await
        .unwrap();

    assert_eq!(answer.outcome, AnswerOutcome::Generated);
    assert_eq!(answer.sources[0], "thermodynamics.txt");
    assert_eq!(answer.text, "Answer: it never decreases");

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0]
            .context
            .starts_with("--- Source: thermodynamics.txt ---")
    );
    assert_eq!(
        calls[0].context.matches("--- Source: ").count(),
        report.passages.min(5)
    );
}

#[tokio::test]
async fn test_refresh_sees_new_documents() {
    let (_temp, config) = workspace();
    let embedder = Arc::new(WordHashEmbedder { dimension: 256 });
    ingest_directory(&config, embedder.as_ref()).await.unwrap();

    let pipeline = build_pipeline(&config, Arc::clone(&embedder), MockGenerator::new());
    pipeline.ensure_index().unwrap();
    let before = pipeline.store().read().unwrap().len();

    fs::write(
        config.ingest.documents_dir.join("waves.txt"),
        "Standing waves form when two identical waves travel in opposite directions.",
    )
    .unwrap();
    ingest_directory(&config, embedder.as_ref()).await.unwrap();

    assert!(pipeline.refresh().unwrap());
    let after = pipeline.store().read().unwrap().len();
    assert!(after > before);

    let hits = pipeline.retrieve("standing waves", 1).await.unwrap();
    assert_eq!(hits[0].passage.source, "waves.txt");
}
