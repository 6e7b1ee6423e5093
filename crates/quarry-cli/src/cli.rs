//! Command-line definition for the `quarry` binary.

use std::path::PathBuf;

/// Command-line arguments for the quarry CLI
#[derive(clap::Parser)]
#[command(name = "quarry")]
#[command(about = "Answer questions from your own documents", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./quarry.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Chunk, embed and index the documents directory
    Ingest {
        /// Documents directory (overrides config)
        #[arg(short, long)]
        documents: Option<PathBuf>,
    },

    /// Answer a question from the indexed documents
    Ask {
        /// The question to answer
        question: String,

        /// Passages to retrieve (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show the passages most similar to a query
    Search {
        /// The query to search for
        query: String,

        /// Passages to retrieve (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show index statistics
    Stats,

    /// Show the effective configuration
    Config,
}
