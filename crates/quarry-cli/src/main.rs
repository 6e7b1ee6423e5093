//! Quarry CLI - question answering over local documents
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Allow for tests"
    )
)]

use anyhow::Result;
use clap::Parser as _;
use quarry_core::QuarryConfig;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt as _, registry, util::SubscriberInitExt as _,
};

mod cli;
mod handlers;
mod services;

use cli::{Cli, Commands};
use services::Services;

#[tokio::main]
async fn main() -> Result<()> {
    registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry=info,quarry_context=info,quarry_cli=info".into()),
        )
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = QuarryConfig::load(cli.config.as_deref())?;
    if let Commands::Ingest {
        documents: Some(documents),
    } = &cli.command
    {
        config.ingest.documents_dir.clone_from(documents);
    }
    let services = Services::new(config);

    match cli.command {
        Commands::Ingest { .. } => handlers::handle_ingest(&services).await?,
        Commands::Ask { question, top_k } => {
            handlers::handle_ask(&services, &question, top_k).await?;
        }
        Commands::Search { query, top_k } => {
            handlers::handle_search(&services, &query, top_k).await?;
        }
        Commands::Stats => handlers::handle_stats(&services)?,
        Commands::Config => handlers::handle_config(&services)?,
    }

    Ok(())
}
