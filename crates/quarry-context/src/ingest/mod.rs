//! Document ingestion: read, chunk, embed in batches, index and save.

mod reader;

pub use reader::{Document, DocumentKind, TextFragments, discover_documents};

use std::fs::{self, File};
use std::io::Read;
use std::mem::{replace, take};

use quarry_core::{ChunkingConfig, EmbeddingProvider, Error, Passage, QuarryConfig, Result};
use tracing::{info, warn};

use crate::chunking::StreamingAssembler;
use crate::index::VectorStore;

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents read
    pub files: usize,
    /// Documents skipped (unsupported or unreadable)
    pub skipped: usize,
    /// Documents whose read failed partway; passages read before the failure are kept
    pub incomplete: usize,
    /// Passages added by this run
    pub passages: usize,
    /// Records in the index after the run
    pub records: usize,
}

/// Feeds documents through the streaming assembler and appends embedded
/// batches to an exclusively owned store.
pub struct Ingestor<'embedder, E: EmbeddingProvider> {
    embedder: &'embedder E,
    store: VectorStore,
    assembler: StreamingAssembler,
    batch: Vec<Passage>,
    batch_size: usize,
    added: usize,
}

impl<'embedder, E: EmbeddingProvider> Ingestor<'embedder, E> {
    /// Create an ingestor appending to `store`.
    ///
    /// # Errors
    /// Returns `NotInitialized` if the store has no index, or
    /// `DimensionMismatch` if it disagrees with the embedder
    pub fn new(
        embedder: &'embedder E,
        store: VectorStore,
        chunking: ChunkingConfig,
        batch_size: usize,
    ) -> Result<Self> {
        let Some(dimension) = store.dimension() else {
            return Err(Error::NotInitialized(
                "create or load the index before ingesting".to_owned(),
            ));
        };
        if dimension != embedder.dimension() {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: embedder.dimension(),
            });
        }
        if let Err(error) = chunking.validate() {
            warn!("Chunking configuration hazard: {error}");
        }

        Ok(Self {
            embedder,
            store,
            assembler: StreamingAssembler::new(chunking),
            batch: Vec::default(),
            batch_size: batch_size.max(1),
            added: 0,
        })
    }

    /// Passages appended to the store so far.
    pub fn added(&self) -> usize {
        self.added
    }

    /// Feed one text fragment of document `source`.
    ///
    /// # Errors
    /// Returns an error if embedding or indexing a full batch fails
    pub async fn feed(&mut self, fragment: &str, source: &str) -> Result<()> {
        let passages = self.assembler.feed(fragment, source);
        self.enqueue(passages).await
    }

    /// Flush the current document.
    ///
    /// # Errors
    /// Returns an error if embedding or indexing a full batch fails
    pub async fn end_document(&mut self) -> Result<()> {
        let passages = self.assembler.finish();
        self.enqueue(passages).await
    }

    /// Read `reader` in blocks of `block_bytes` as one document named `source`.
    ///
    /// Returns `false` if reading stopped early on an I/O error. Passages
    /// assembled before the failure stay in the store.
    ///
    /// # Errors
    /// Returns an error if embedding or indexing a full batch fails
    pub async fn ingest_reader<R: Read + Send>(
        &mut self,
        reader: R,
        source: &str,
        block_bytes: usize,
    ) -> Result<bool> {
        let mut complete = true;
        for fragment in TextFragments::new(reader, block_bytes) {
            match fragment {
                Ok(text) => self.feed(&text, source).await?,
                Err(error) => {
                    warn!("Error reading {source}: {error}");
                    complete = false;
                    break;
                }
            }
        }
        self.end_document().await?;
        Ok(complete)
    }

    /// Flush everything and hand back the store.
    ///
    /// # Errors
    /// Returns an error if embedding or indexing the final batch fails
    pub async fn finish(mut self) -> Result<VectorStore> {
        self.end_document().await?;
        if !self.batch.is_empty() {
            let batch = take(&mut self.batch);
            self.index_batch(batch).await?;
        }
        Ok(self.store)
    }

    async fn enqueue(&mut self, passages: Vec<Passage>) -> Result<()> {
        self.batch.extend(passages);
        while self.batch.len() >= self.batch_size {
            let rest = self.batch.split_off(self.batch_size);
            let batch = replace(&mut self.batch, rest);
            self.index_batch(batch).await?;
        }
        Ok(())
    }

    async fn index_batch(&mut self, batch: Vec<Passage>) -> Result<()> {
        let texts = batch.iter().map(|passage| passage.content.clone()).collect();
        let vectors = self.embedder.embed_passages(texts).await?;
        let ids = self.store.add(vectors, batch)?;
        self.added += ids.len();
        info!(
            "Indexed batch of {} passages ({} this run)",
            ids.len(),
            self.added
        );
        Ok(())
    }
}

/// Ingest every document in the configured directory into the persisted index.
///
/// A missing documents directory is created and the run stops, as does a
/// directory with no text documents; neither touches the index. Existing
/// artifacts are extended; otherwise a new index is created. PDFs and
/// unreadable files are skipped with a warning.
///
/// # Errors
/// Returns an error if the index cannot be loaded or saved, or if embedding fails
pub async fn ingest_directory<E: EmbeddingProvider>(
    config: &QuarryConfig,
    embedder: &E,
) -> Result<IngestReport> {
    let documents_dir = &config.ingest.documents_dir;
    if !documents_dir.exists() {
        fs::create_dir_all(documents_dir)?;
        warn!(
            "Created {}. Add .txt files to it and run ingest again.",
            documents_dir.display()
        );
        return Ok(IngestReport::default());
    }

    let mut report = IngestReport::default();
    let mut texts = Vec::default();
    for document in discover_documents(documents_dir)? {
        if document.kind == DocumentKind::Pdf {
            warn!(
                "Skipping {}: PDF text extraction is not supported",
                document.path.display()
            );
            report.skipped += 1;
        } else {
            texts.push(document);
        }
    }
    if texts.is_empty() {
        info!("No documents found in {}", documents_dir.display());
        return Ok(report);
    }

    let vector_path = config.index.vector_path();
    let metadata_path = config.index.metadata_path();
    let mut store = VectorStore::default();
    if !store.load(&vector_path, &metadata_path)? {
        info!("Creating new index with dimension {}", config.index.dimension);
        store.create(config.index.dimension)?;
    }

    let existing = store.len();
    let mut ingestor = Ingestor::new(
        embedder,
        store,
        config.chunking.clone(),
        config.embedding.batch_size,
    )?;

    for document in texts {
        let file = match File::open(&document.path) {
            Ok(file) => file,
            Err(error) => {
                warn!("Error processing {}: {error}", document.path.display());
                report.skipped += 1;
                continue;
            }
        };

        info!("Processing {}", document.path.display());
        let complete = ingestor
            .ingest_reader(file, &document.source(), config.ingest.read_block_bytes)
            .await?;
        if complete {
            report.files += 1;
        } else {
            report.incomplete += 1;
        }
    }

    let indexed = ingestor.finish().await?;
    report.passages = indexed.len() - existing;
    indexed.save(&vector_path, &metadata_path)?;
    report.records = indexed.len();

    info!(
        "Ingested {} files ({} skipped, {} incomplete), {} passages, {} records total",
        report.files, report.skipped, report.incomplete, report.passages, report.records
    );
    Ok(report)
}
