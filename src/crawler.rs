use crate::{
    config::{CrawlConfig, ListingMode},
    document::Document,
    extract::{self, LISTING_CONTAINER, LISTING_ENTRY},
    frontier::Frontier,
    page::PageAccess,
    policy::{Decision, HaltReason, StopPolicy},
    utils, CrawlerError,
};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, warn};

const COOKIE_ACCEPT: &str = "Accept All Cookies";

/// How a crawl ended. None of these is a failure for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Pagination ran out of listing pages.
    Exhausted,
    Halted(HaltReason),
    /// An unexpected error ended the crawl early.
    Aborted(String),
}

/// Drives one incremental harvest over the listing.
pub struct Crawler<P> {
    page: P,
    config: CrawlConfig,
    policy: StopPolicy,
    documents: Vec<Document>,
}

impl<P: PageAccess + Send> Crawler<P> {
    /// `last_document` is the newest document accepted by a previous run.
    pub fn new(page: P, mut config: CrawlConfig, last_document: Option<&Document>) -> Self {
        if config.mode == ListingMode::NextControl && !config.isolate_details {
            debug!("Click-through listing keeps the listing page, detail visits are isolated");
            config.isolate_details = true;
        }
        let policy = StopPolicy::new(
            last_document.map(|doc| doc.identity_hash.clone()),
            config.max_documents,
        );
        Crawler {
            page,
            config,
            policy,
            documents: vec![],
        }
    }

    /// Accepted documents in listing order; partial when the crawl stopped early.
    pub async fn content(self) -> Vec<Document> {
        self.run().await.0
    }

    pub async fn run(mut self) -> (Vec<Document>, CrawlOutcome) {
        debug!("Parse process start");
        let outcome = match self.parse().await {
            Ok(outcome) => {
                debug!("Parse process finished: {:?}", outcome);
                outcome
            }
            Err(e) => {
                warn!("Parsing stopped with error: {}", e);
                CrawlOutcome::Aborted(e.to_string())
            }
        };
        (self.documents, outcome)
    }

    async fn parse(&mut self) -> Result<CrawlOutcome, CrawlerError> {
        debug!("Parser enter to {}", self.config.listing_url);
        let mut frontier = Frontier::new(&self.config);

        loop {
            match frontier.advance(&mut self.page).await {
                Ok(true) => {}
                Ok(false) => return Ok(CrawlOutcome::Exhausted),
                Err(CrawlerError::PageNotFound(url)) => {
                    debug!("Listing page {} does not exist", url);
                    return Ok(CrawlOutcome::Exhausted);
                }
                Err(e) => return Err(e),
            }
            settle(self.config.listing_delay).await;
            self.accept_cookies().await;

            let docs = match self.listing_documents().await {
                Some(docs) => docs,
                None => return Ok(CrawlOutcome::Exhausted),
            };

            for mut doc in docs {
                if let Err(e) = self.visit_detail(&mut doc).await {
                    warn!("Skip document {}: {}", doc.web_link, e);
                    continue;
                }
                if let Decision::Halt(reason) = self.policy.evaluate(doc, &mut self.documents) {
                    return Ok(CrawlOutcome::Halted(reason));
                }
            }
        }
    }

    /// Documents of the current listing page, `None` when the listing is empty
    /// or never rendered.
    async fn listing_documents(&mut self) -> Option<Vec<Document>> {
        if let Err(e) = self
            .page
            .wait_for(LISTING_CONTAINER, self.config.wait_timeout)
            .await
        {
            debug!("Listing did not render: {}", e);
            return None;
        }

        let entries = self.page.find_all(LISTING_ENTRY);
        if entries.is_empty() {
            debug!("Listing is empty on {:?}", self.page.current_url());
            return None;
        }

        let base = self.page.current_url().and_then(|url| Url::parse(url).ok());
        let docs = entries
            .iter()
            .filter_map(
                |entry| match extract::listing_document(entry, base.as_ref()) {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        debug!("Skip listing entry: {}", e);
                        None
                    }
                },
            )
            .collect();
        Some(docs)
    }

    async fn visit_detail(&mut self, doc: &mut Document) -> Result<(), CrawlerError> {
        if !self.config.isolate_details {
            return self.read_detail(doc).await;
        }

        self.page.open_context().await?;
        let result = self.read_detail(doc).await;
        self.page.close_context().await?;
        result
    }

    async fn read_detail(&mut self, doc: &mut Document) -> Result<(), CrawlerError> {
        self.page.load(&doc.web_link).await?;
        debug!("Entered on web page {}", doc.web_link);
        settle(self.config.detail_delay).await;
        self.accept_cookies().await;

        let body = extract::body_text(&self.page);
        doc.attach_body(body, utils::get_now());
        Ok(())
    }

    /// Dismisses the cookie consent modal if there is one.
    async fn accept_cookies(&mut self) {
        let button = self
            .page
            .find_all("button")
            .into_iter()
            .find(|button| button.text() == COOKIE_ACCEPT);

        let url = self.page.current_url().map(ToString::to_string);
        match button {
            Some(button) => match self.page.click(&button).await {
                Ok(()) => debug!("Parser pass cookie modal on page: {:?}", url),
                Err(e) => debug!("Cookie modal left open on page {:?}: {}", url, e),
            },
            None => debug!("Modal agree not found on page: {:?}", url),
        }
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
