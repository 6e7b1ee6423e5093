//! Command handlers for CLI operations

use anyhow::Result;
use quarry_context::ingest::{DocumentKind, discover_documents};
use quarry_context::{AnswerOutcome, IngestReport, ingest_directory};
use quarry_core::IgnorePoison as _;
use tracing::info;

use crate::services::Services;

/// Ingest the documents directory into the persisted index.
///
/// # Errors
/// Returns an error if the embedding model is unavailable or ingestion fails
pub async fn handle_ingest(services: &Services) -> Result<()> {
    let embedder = services.embedder();
    if has_text_documents(services)? {
        embedder.ensure_model_available().await?;
    }

    let report = ingest_directory(services.config(), embedder.as_ref()).await?;
    if report == IngestReport::default() {
        return Ok(());
    }

    info!("{sep}", sep = "=".repeat(60));
    info!("Files ingested: {}", report.files);
    info!("Files skipped: {}", report.skipped);
    info!("Files read partially: {}", report.incomplete);
    info!("Passages added: {}", report.passages);
    info!("Index records: {}", report.records);
    info!("{sep}", sep = "=".repeat(60));
    Ok(())
}

/// Answer a question and print the answer with its sources.
///
/// # Errors
/// Returns an error if the system is not ready or embedding fails
pub async fn handle_ask(services: &Services, question: &str, top_k: Option<usize>) -> Result<()> {
    let pipeline = services.pipeline(top_k);
    info!("Processing question: {question}");

    let answer = pipeline.ask(question).await?;

    info!("\n{sep}\n", sep = "=".repeat(80));
    info!("{text}", text = answer.text);
    info!("{sep}", sep = "=".repeat(80));
    match answer.outcome {
        AnswerOutcome::Generated => {
            info!("Sources:");
            for source in &answer.sources {
                info!("  - {source}");
            }
        }
        AnswerOutcome::GenerationFailed => {
            info!("Sources retrieved before the failure: {}", answer.sources.join(", "));
        }
        AnswerOutcome::NoResults => {}
    }
    Ok(())
}

/// Print the passages most similar to a query.
///
/// # Errors
/// Returns an error if no index is available or embedding fails
pub async fn handle_search(services: &Services, query: &str, top_k: Option<usize>) -> Result<()> {
    let pipeline = services.pipeline(top_k);
    let hits = pipeline.retrieve(query, pipeline.top_k()).await?;

    if hits.is_empty() {
        info!("No matching passages.");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        info!(
            "{}. [{:.4}] {} (#{})",
            rank + 1,
            hit.score,
            hit.passage.source,
            hit.id
        );
        info!("   {}", preview(&hit.passage.content, 160));
    }
    Ok(())
}

/// Print index statistics.
///
/// # Errors
/// Returns an error if no index is available
pub fn handle_stats(services: &Services) -> Result<()> {
    let pipeline = services.pipeline(None);
    pipeline.ensure_index()?;

    let stats = pipeline.store().read_ignore_poison().stats();
    if let Some(stats) = stats {
        let index = &services.config().index;
        info!("Index: {}", index.directory.display());
        info!("  Records: {}", stats.records);
        info!("  Dimension: {}", stats.dimension);
        info!("  Sources: {}", stats.sources);
    }
    Ok(())
}

/// Print the effective configuration with secrets redacted.
///
/// # Errors
/// Returns an error if the configuration cannot be serialized
pub fn handle_config(services: &Services) -> Result<()> {
    info!("\n{}", services.config().to_redacted_toml()?);
    Ok(())
}

/// Whether the documents directory holds anything ingestion would embed.
fn has_text_documents(services: &Services) -> Result<bool> {
    let documents_dir = &services.config().ingest.documents_dir;
    if !documents_dir.exists() {
        return Ok(false);
    }
    Ok(discover_documents(documents_dir)?
        .iter()
        .any(|document| document.kind == DocumentKind::Text))
}

/// First `max_chars` chars of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flattened: String = text
        .chars()
        .map(|letter| if letter.is_whitespace() { ' ' } else { letter })
        .collect();
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let mut cut: String = flattened.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
