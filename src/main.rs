use clap::Parser;
use epc_harvester::{
    config::{DEFAULT_LISTING_URL, DEFAULT_MAX_DOCUMENTS},
    page::{HtmlPage, HttpFetcher},
    store::DocumentStore,
    CrawlConfig, Crawler, Document, ListingMode,
};
use std::{path::PathBuf, time::Duration};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Harvest new documents from the European Payments Council listing.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Listing page to start from
    #[arg(long, default_value = DEFAULT_LISTING_URL)]
    url: String,

    /// How to move between listing pages
    #[arg(long, value_enum, default_value_t = ListingMode::PageParam)]
    mode: ListingMode,

    /// Stop after this many documents, 0 for no limit
    #[arg(long, default_value_t = DEFAULT_MAX_DOCUMENTS)]
    max_documents: usize,

    /// JSON file with the newest document of a previous run
    #[arg(long)]
    last_document: Option<PathBuf>,

    /// SQLite database (without `.db`) to resume from and save into
    #[arg(long)]
    database: Option<String>,

    /// Seconds to wait for the listing to render
    #[arg(long, default_value_t = 20)]
    wait_timeout: u64,

    /// Seconds to settle after loading a listing page
    #[arg(long, default_value_t = 2)]
    listing_delay: u64,

    /// Seconds to settle after loading a detail page
    #[arg(long, default_value_t = 3)]
    detail_delay: u64,

    /// Read detail pages in the listing's own browsing context
    #[arg(long)]
    no_isolation: bool,
}

impl Cli {
    fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            listing_url: self.url.clone(),
            mode: self.mode,
            max_documents: Some(self.max_documents),
            wait_timeout: Duration::from_secs(self.wait_timeout),
            listing_delay: Duration::from_secs(self.listing_delay),
            detail_delay: Duration::from_secs(self.detail_delay),
            isolate_details: !self.no_isolation,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "debug,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();

    let store = match cli.database.as_deref() {
        Some(name) => Some(DocumentStore::new(name).await?),
        None => None,
    };

    let last_document: Option<Document> = match (cli.last_document.as_ref(), store.as_ref()) {
        (Some(path), _) => Some(serde_json::from_str(
            &tokio::fs::read_to_string(path).await?,
        )?),
        (None, Some(store)) => store.last_document().await?,
        (None, None) => None,
    };
    if let Some(doc) = last_document.as_ref() {
        info!("Resume until {}", doc.web_link);
    }

    let page = HtmlPage::new(HttpFetcher::new()?);
    let (docs, outcome) = Crawler::new(page, cli.crawl_config(), last_document.as_ref())
        .run()
        .await;
    info!("Harvested {} documents ({:?})", docs.len(), outcome);

    if let Some(store) = store.as_ref() {
        store.insert_batch(&docs).await?;
    }

    for doc in &docs {
        println!("{}", serde_json::to_string(doc)?);
    }

    Ok(())
}
