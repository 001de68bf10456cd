use std::time::Duration;

pub const DEFAULT_LISTING_URL: &str = "https://www.europeanpaymentscouncil.eu/search";
pub const DEFAULT_MAX_DOCUMENTS: usize = 100;

/// How the crawler moves from one listing page to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ListingMode {
    /// Synthesize `?page=n` URLs.
    #[default]
    PageParam,
    /// Click the listing's own "next page" control.
    NextControl,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub listing_url: String,
    pub mode: ListingMode,
    /// `None` or `Some(0)` means no limit.
    pub max_documents: Option<usize>,
    /// Upper bound for the listing container to render.
    pub wait_timeout: Duration,
    /// Settle time after loading a listing page.
    pub listing_delay: Duration,
    /// Settle time after loading a detail page.
    pub detail_delay: Duration,
    /// Read detail pages in an auxiliary browsing context.
    pub isolate_details: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            mode: ListingMode::default(),
            max_documents: Some(DEFAULT_MAX_DOCUMENTS),
            wait_timeout: Duration::from_secs(20),
            listing_delay: Duration::from_secs(2),
            detail_delay: Duration::from_secs(3),
            isolate_details: true,
        }
    }
}

impl CrawlConfig {
    pub fn new<S: Into<String>>(listing_url: S) -> Self {
        CrawlConfig {
            listing_url: listing_url.into(),
            ..CrawlConfig::default()
        }
    }

    /// Zero delays and a zero wait timeout, for static pages that render at once.
    pub fn without_delays(mut self) -> Self {
        self.wait_timeout = Duration::ZERO;
        self.listing_delay = Duration::ZERO;
        self.detail_delay = Duration::ZERO;
        self
    }
}
