use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "docgraph")]
#[command(about = "docgraph - question answering over a documentation knowledge graph")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.config/docgraph/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `docgraph_knowledge=trace`
    /// (RUST_LOG wins, then this, then `logging.level` from the config)
    #[arg(short = 'l', long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the documentation site and save raw HTML pages
    Crawl {
        /// Seed URL (overrides `crawl.seed_url`)
        #[arg(long)]
        seed: Option<String>,

        /// Stop after this many pages (overrides `crawl.max_pages`)
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Convert crawled pages to structured markdown
    Parse,

    /// Extract entities from parsed pages into the graph
    Ingest {
        /// Upsert on top of the existing graph instead of rebuilding it
        #[arg(long)]
        keep: bool,
    },

    /// Answer a question from the graph
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Print the retrieved context for a question without answering it
    Context {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Show node counts per label
    Stats,
}
