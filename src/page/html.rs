use super::{parse_selector, Element, PageAccess, Scope};
use crate::CrawlerError;
use reqwest::Url;
use scraper::Html;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.53 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Static HTML only changes when fetched again, so waiting means reloading.
const MAX_RELOADS: u32 = 2;

#[async_trait::async_trait]
pub trait Fetch {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlerError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlerError> {
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CrawlerError::PageNotFound(url.to_string()));
        }
        Ok(response.error_for_status()?.text().await?)
    }
}

#[derive(Debug, Default)]
struct Context {
    url: Option<Url>,
    html: Option<String>,
}

/// A page over fetched, static HTML.
///
/// Browsing contexts form a stack: the first one is the main context and the
/// last one is active.
pub struct HtmlPage<F> {
    fetcher: F,
    contexts: Vec<Context>,
}

impl<F: Fetch + Send + Sync> HtmlPage<F> {
    pub fn new(fetcher: F) -> Self {
        HtmlPage {
            fetcher,
            contexts: vec![Context::default()],
        }
    }

    #[cfg(test)]
    pub(crate) fn context_count(&self) -> usize {
        self.contexts.len()
    }

    fn active(&self) -> &Context {
        &self.contexts[self.contexts.len() - 1]
    }

    fn active_mut(&mut self) -> &mut Context {
        let last = self.contexts.len() - 1;
        &mut self.contexts[last]
    }

    fn resolve(&self, url: &str) -> Result<Url, CrawlerError> {
        let parsed = match self.active().url.as_ref() {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|_| CrawlerError::InvalidUrl(url.to_string()))
    }

    async fn navigate(&mut self, url: Url) -> Result<(), CrawlerError> {
        debug!("Visit {}", url);
        let html = self.fetcher.fetch(&url).await?;
        let context = self.active_mut();
        context.url = Some(url);
        context.html = Some(html);
        Ok(())
    }

    fn matches(&self, selector: &str) -> bool {
        !self.find_all(selector).is_empty()
    }
}

impl<F> Scope for HtmlPage<F> {
    fn find(&self, selector: &str) -> Option<Element> {
        self.find_all(selector).into_iter().next()
    }

    fn find_all(&self, selector: &str) -> Vec<Element> {
        let html = match self.contexts.last().and_then(|c| c.html.as_ref()) {
            Some(html) => html,
            None => return vec![],
        };
        let selector = match parse_selector(selector) {
            Some(s) => s,
            None => return vec![],
        };
        let doc = Html::parse_document(html);
        doc.select(&selector).map(Element::from_ref).collect()
    }
}

#[async_trait::async_trait]
impl<F: Fetch + Send + Sync> PageAccess for HtmlPage<F> {
    async fn load(&mut self, url: &str) -> Result<(), CrawlerError> {
        let url = self.resolve(url)?;
        self.navigate(url).await
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), CrawlerError> {
        let started = Instant::now();
        let mut interval = POLL_INTERVAL;
        let mut reloads = 0;
        loop {
            if self.matches(selector) {
                return Ok(());
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout || reloads == MAX_RELOADS {
                return Err(CrawlerError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(interval.min(timeout - elapsed)).await;
            interval *= 2;
            reloads += 1;

            let url = self.active().url.clone().ok_or(CrawlerError::NoPage)?;
            debug!("Reload {} waiting for `{}`", url, selector);
            self.navigate(url).await?;
        }
    }

    async fn click(&mut self, element: &Element) -> Result<(), CrawlerError> {
        match element.attr("href") {
            Some(href) => self.load(&href).await,
            None => Err(CrawlerError::NotClickable(element.text())),
        }
    }

    async fn open_context(&mut self) -> Result<(), CrawlerError> {
        self.contexts.push(Context::default());
        Ok(())
    }

    async fn close_context(&mut self) -> Result<(), CrawlerError> {
        if self.contexts.len() < 2 {
            return Err(CrawlerError::NoAuxiliaryContext);
        }
        self.contexts.pop();
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.active().url.as_ref().map(Url::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Site;
    use pretty_assertions::assert_eq;

    fn site() -> Site {
        Site::default()
            .page(
                "https://example.org/list",
                r#"<html><body><a class="next" href="/list?page=1">Next</a>
                   <button>Accept All Cookies</button></body></html>"#,
            )
            .page(
                "https://example.org/list?page=1",
                "<html><body><p>second</p></body></html>",
            )
    }

    #[tokio::test]
    async fn load_and_query() {
        let mut page = HtmlPage::new(site());
        assert_eq!(page.find("a"), None);
        assert_eq!(page.current_url(), None);

        page.load("https://example.org/list").await.unwrap();
        assert_eq!(page.current_url(), Some("https://example.org/list"));
        assert_eq!(page.find("a.next").unwrap().text(), "Next");
        assert_eq!(page.find_all("button").len(), 1);
    }

    #[tokio::test]
    async fn click_follows_relative_href() {
        let mut page = HtmlPage::new(site());
        page.load("https://example.org/list").await.unwrap();

        let next = page.find("a.next").unwrap();
        page.click(&next).await.unwrap();
        assert_eq!(page.current_url(), Some("https://example.org/list?page=1"));
        assert_eq!(page.find("p").unwrap().text(), "second");
    }

    #[tokio::test]
    async fn click_without_href_fails() {
        let mut page = HtmlPage::new(site());
        page.load("https://example.org/list").await.unwrap();

        let button = page.find("button").unwrap();
        assert!(matches!(
            page.click(&button).await,
            Err(CrawlerError::NotClickable(_))
        ));
    }

    #[tokio::test]
    async fn auxiliary_context_preserves_main_page() {
        let mut page = HtmlPage::new(site());
        page.load("https://example.org/list").await.unwrap();

        page.open_context().await.unwrap();
        assert_eq!(page.context_count(), 2);
        assert_eq!(page.current_url(), None);
        page.load("https://example.org/list?page=1").await.unwrap();
        assert!(page.find("a.next").is_none());

        page.close_context().await.unwrap();
        assert_eq!(page.current_url(), Some("https://example.org/list"));
        assert!(page.find("a.next").is_some());

        assert!(matches!(
            page.close_context().await,
            Err(CrawlerError::NoAuxiliaryContext)
        ));
    }

    #[tokio::test]
    async fn wait_for_times_out() {
        let site = site();
        let mut page = HtmlPage::new(site.clone());
        page.load("https://example.org/list").await.unwrap();

        page.wait_for("a.next", Duration::ZERO).await.unwrap();
        assert_eq!(site.visits().len(), 1);
        assert!(matches!(
            page.wait_for(".view-content", Duration::from_millis(20)).await,
            Err(CrawlerError::Timeout { .. })
        ));
        assert_eq!(site.visits().len(), 2);
    }

    #[tokio::test]
    async fn wait_for_caps_reloads() {
        let site = site();
        let mut page = HtmlPage::new(site.clone());
        page.load("https://example.org/list").await.unwrap();

        let started = Instant::now();
        assert!(matches!(
            page.wait_for(".view-content", Duration::from_secs(20)).await,
            Err(CrawlerError::Timeout { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(
            site.visits(),
            vec!["https://example.org/list"; 1 + MAX_RELOADS as usize]
        );
    }

    #[tokio::test]
    async fn missing_page_is_an_error() {
        let mut page = HtmlPage::new(site());
        assert!(matches!(
            page.load("https://example.org/missing").await,
            Err(CrawlerError::PageNotFound(_))
        ));
        assert!(matches!(
            page.load("not a url").await,
            Err(CrawlerError::InvalidUrl(_))
        ));
    }
}
