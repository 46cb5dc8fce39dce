use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};
use docgraph_core::{Config, Settings};
use docgraph_knowledge::documents::{load_json, save_json};
use docgraph_knowledge::paths::{parsed_documents_path, raw_pages_path};
use docgraph_knowledge::{
    CrawlConfig, DocGraphEngine, HttpFetcher, ParsedDocument, RawPage, crawl_site, parse_pages,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    docgraph_core::load_dotenv();
    let settings = match &cli.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };

    let fallback = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_settings(settings);

    match cli.command {
        Commands::Crawl { seed, max_pages } => run_crawl(&config, seed, max_pages).await,
        Commands::Parse => run_parse(&config).await,
        Commands::Ingest { keep } => run_ingest(&config, keep).await,
        Commands::Ask { question } => run_ask(&config, &question.join(" ")).await,
        Commands::Context { question } => run_context(&config, &question.join(" ")).await,
        Commands::Stats => run_stats(&config).await,
    }
}

async fn run_crawl(config: &Config, seed: Option<String>, max_pages: Option<usize>) -> CliResult<()> {
    let mut crawl_settings = config.settings.crawl.clone();
    if let Some(seed) = seed {
        crawl_settings.seed_url = seed;
    }
    if max_pages.is_some() {
        crawl_settings.max_pages = max_pages;
    }

    let fetcher = HttpFetcher::new(&crawl_settings)?;
    let crawl_config = CrawlConfig::from_settings(&crawl_settings)?;
    info!(seed = %crawl_config.seed_url, "starting crawl");

    let pages = crawl_site(&fetcher, &crawl_config).await?;
    let path = raw_pages_path(&config.knowledge_settings())?;
    save_json(&path, &pages).await?;

    println!("Crawled {} pages into {}", pages.len(), path.display());
    Ok(())
}

async fn run_parse(config: &Config) -> CliResult<()> {
    let knowledge = config.knowledge_settings();
    let pages: Vec<RawPage> = load_json(&raw_pages_path(&knowledge)?).await?;
    let documents = parse_pages(&pages);
    let path = parsed_documents_path(&knowledge)?;
    save_json(&path, &documents).await?;

    println!(
        "Parsed {} of {} pages into {}",
        documents.len(),
        pages.len(),
        path.display()
    );
    Ok(())
}

async fn run_ingest(config: &Config, keep: bool) -> CliResult<()> {
    let api_key = config.llm_api_key()?.to_string();
    let knowledge = config.knowledge_settings();
    let documents: Vec<ParsedDocument> = load_json(&parsed_documents_path(&knowledge)?).await?;

    let engine = DocGraphEngine::open(knowledge, &config.settings.llm, Some(api_key)).await?;
    let report = if keep {
        engine.ingest(&documents).await
    } else {
        engine.rebuild(&documents).await?
    };

    println!(
        "Ingested {} documents ({} failed, {} empty)",
        report.documents_processed, report.documents_failed, report.documents_skipped
    );
    for (label, count) in &report.entities {
        println!("  {label}: {count}");
    }
    Ok(())
}

async fn run_ask(config: &Config, question: &str) -> CliResult<()> {
    let api_key = config.llm_api_key()?.to_string();
    let engine = DocGraphEngine::open(
        config.knowledge_settings(),
        &config.settings.llm,
        Some(api_key),
    )
    .await?;

    let answer = engine.ask(question).await?;
    println!("{}", answer.text());
    Ok(())
}

async fn run_context(config: &Config, question: &str) -> CliResult<()> {
    let engine = open_read_only(config).await?;
    let context = engine.retrieve_context(question).await?;
    if context.is_empty() {
        println!("No relevant entities found.");
    } else {
        print!("{context}");
    }
    Ok(())
}

async fn run_stats(config: &Config) -> CliResult<()> {
    let engine = open_read_only(config).await?;
    for (label, count) in engine.counts().await? {
        println!("{label}: {count}");
    }
    Ok(())
}

/// Engine for commands that never reach the chat endpoint.
async fn open_read_only(config: &Config) -> CliResult<DocGraphEngine> {
    Ok(DocGraphEngine::open(
        config.knowledge_settings(),
        &config.settings.llm,
        config.secrets.llm_api_key.clone(),
    )
    .await?)
}
