//! Save/load behavior of the vector store on disk.

use std::fs;

use quarry_context::VectorStore;
use quarry_core::{Error, IndexConfig, Passage};
use tempfile::TempDir;

use crate::support::WordHashEmbedder;

fn corpus() -> Vec<Passage> {
    [
        ("Limits describe values a function approaches.", "calculus.txt"),
        ("Momentum is mass times velocity.", "physics.txt"),
        ("A derivative is the limit of a difference quotient.", "calculus.txt"),
        ("Kinetic energy grows with the square of velocity.", "physics.txt"),
    ]
    .into_iter()
    .map(|(content, source)| Passage::new(content, source))
    .collect()
}

fn build_store(embedder: &WordHashEmbedder) -> VectorStore {
    let passages = corpus();
    let vectors = passages
        .iter()
        .map(|passage| embedder.vector(&passage.content))
        .collect();
    let mut store = VectorStore::default();
    store.create(embedder.dimension).unwrap();
    store.add(vectors, passages).unwrap();
    store
}

#[test]
fn test_reloaded_store_answers_queries_identically() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = IndexConfig {
        directory: temp.path().join("deep").join("index"),
        ..IndexConfig::default()
    };
    let embedder = WordHashEmbedder { dimension: 128 };
    let store = build_store(&embedder);
    store
        .save(&config.vector_path(), &config.metadata_path())
        .unwrap();

    let mut reloaded: VectorStore = VectorStore::default();
    assert!(
        reloaded
            .load(&config.vector_path(), &config.metadata_path())
            .unwrap()
    );

    for question in ["what is a derivative", "velocity and mass", "unrelated words"] {
        let query = embedder.vector(question);
        assert_eq!(
            reloaded.search(&query, 4).unwrap(),
            store.search(&query, 4).unwrap(),
            "query {question}"
        );
    }
    assert_eq!(reloaded.stats(), store.stats());
}

#[test]
fn test_metadata_file_is_readable_json() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = IndexConfig {
        directory: temp.path().to_path_buf(),
        ..IndexConfig::default()
    };
    build_store(&WordHashEmbedder { dimension: 32 })
        .save(&config.vector_path(), &config.metadata_path())
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(config.metadata_path()).unwrap()).unwrap();
    assert_eq!(json["version"], 1);
    assert_eq!(json["passages"][1]["content"], "Momentum is mass times velocity.");
    assert_eq!(json["passages"][1]["source"], "physics.txt");
}

#[test]
fn test_save_overwrites_previous_pair() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = IndexConfig {
        directory: temp.path().to_path_buf(),
        ..IndexConfig::default()
    };
    let embedder = WordHashEmbedder { dimension: 32 };
    let mut store = build_store(&embedder);
    store
        .save(&config.vector_path(), &config.metadata_path())
        .unwrap();

    store
        .add(
            vec![embedder.vector("extra passage")],
            vec![Passage::new("extra passage", "extra.txt")],
        )
        .unwrap();
    store
        .save(&config.vector_path(), &config.metadata_path())
        .unwrap();

    let mut reloaded: VectorStore = VectorStore::default();
    reloaded
        .load(&config.vector_path(), &config.metadata_path())
        .unwrap();
    assert_eq!(reloaded.len(), 5);
    assert_eq!(reloaded.passages()[4].source, "extra.txt");
}

#[test]
fn test_swapped_artifacts_are_corrupt() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = IndexConfig {
        directory: temp.path().to_path_buf(),
        ..IndexConfig::default()
    };
    build_store(&WordHashEmbedder { dimension: 32 })
        .save(&config.vector_path(), &config.metadata_path())
        .unwrap();

    let mut store: VectorStore = VectorStore::default();
    let result = store.load(&config.metadata_path(), &config.vector_path());
    assert!(matches!(result, Err(Error::PersistenceCorrupt(_))));
    assert!(store.dimension().is_none());
}
