use anyhow::{Context, Result};
use clap::Parser;
use news_search::config::Config;
use news_search::search::{MemoryStore, SearchRequest, SearchService, SortDirection, SortField};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter};

/// Keyword search over news records with embedded XML bodies
#[derive(Debug, Parser)]
#[command(name = "news-search", version)]
struct Args {
    /// Keywords: commas separate AND-ed groups, `OR` joins alternatives
    keywords: String,

    /// JSON file holding an array of records
    #[arg(long)]
    records: PathBuf,

    /// Config file (defaults to <config_dir>/news-search/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Page size (defaults to the configured page size)
    #[arg(long)]
    size: Option<usize>,

    /// NAME, CREATED or anything else for relevance
    #[arg(long, default_value = "relevance")]
    sort: String,

    /// ASC or DESC
    #[arg(long, default_value = "desc")]
    direction: String,

    /// Only print the number of matches
    #[arg(long)]
    count: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    let store = MemoryStore::load(&args.records, &config)?;
    tracing::info!("Serving {} records", store.len());
    let service = SearchService::new(Arc::new(store), &config);

    let output = if args.count {
        let outcome = service.count(&args.keywords).await?;
        serde_json::to_string_pretty(&outcome)
    } else {
        let request = SearchRequest::new(
            args.keywords.clone(),
            args.page,
            args.size.unwrap_or(config.default_page_size),
        )
        .sorted_by(
            args.sort.parse::<SortField>()?,
            args.direction.parse::<SortDirection>()?,
        );
        let outcome = service.search(&request).await?;
        serde_json::to_string_pretty(&outcome)
    }
    .context("Failed to serialize result")?;

    println!("{output}");
    Ok(())
}
