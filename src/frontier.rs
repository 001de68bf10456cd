use crate::{
    config::{CrawlConfig, ListingMode},
    page::PageAccess,
    CrawlerError,
};
use tracing::debug;

const NEXT_CONTROLS: &[&str] = &[
    "li.pager__item--next a",
    r#"a[rel="next"]"#,
    ".pager-next a",
];

/// Endless `base?page=n` URLs, `n` counting up from zero.
#[derive(Debug, Clone)]
pub struct PageUrls {
    base: String,
    separator: char,
    page: u64,
}

impl PageUrls {
    pub fn new<S: Into<String>>(base: S) -> Self {
        let base = base.into();
        let separator = if base.contains('?') { '&' } else { '?' };
        PageUrls {
            base,
            separator,
            page: 0,
        }
    }
}

impl Iterator for PageUrls {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let url = format!("{}{}page={}", self.base, self.separator, self.page);
        self.page += 1;
        Some(url)
    }
}

/// Listing pages not visited yet.
///
/// Advancing loads the next listing page into the active browsing context.
#[derive(Debug, Clone)]
pub enum Frontier {
    PageParam(PageUrls),
    NextControl { start: String, started: bool },
}

impl Frontier {
    pub fn new(config: &CrawlConfig) -> Self {
        match config.mode {
            ListingMode::PageParam => Frontier::PageParam(PageUrls::new(config.listing_url.clone())),
            ListingMode::NextControl => Frontier::NextControl {
                start: config.listing_url.clone(),
                started: false,
            },
        }
    }

    /// Loads the next listing page. `Ok(false)` means there is none.
    pub async fn advance<P>(&mut self, page: &mut P) -> Result<bool, CrawlerError>
    where
        P: PageAccess + Send + ?Sized,
    {
        match self {
            Frontier::PageParam(urls) => match urls.next() {
                Some(url) => {
                    page.load(&url).await?;
                    Ok(true)
                }
                None => Ok(false),
            },
            Frontier::NextControl { start, started } => {
                if !*started {
                    *started = true;
                    page.load(start).await?;
                    return Ok(true);
                }
                let control = NEXT_CONTROLS.iter().find_map(|s| page.find(s));
                match control {
                    Some(control) => {
                        page.click(&control).await?;
                        Ok(true)
                    }
                    None => {
                        debug!("No next page control on {:?}", page.current_url());
                        Ok(false)
                    }
                }
            }
        }
    }
}
