//! Access to rendered pages.
//!
//! The crawler only talks to pages through [`PageAccess`]; element lookups that
//! miss are an expected outcome and come back as `None` or an empty vector.

mod html;

pub use html::{Fetch, HtmlPage, HttpFetcher};

use crate::{utils, CrawlerError};
use lazy_regex::regex_captures;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::warn;

/// Anything elements can be looked up in: a whole page or a single element.
pub trait Scope {
    fn find(&self, selector: &str) -> Option<Element>;
    fn find_all(&self, selector: &str) -> Vec<Element>;
}

#[async_trait::async_trait]
pub trait PageAccess: Scope {
    /// Navigates the active browsing context to `url`, which may be relative to
    /// the current page.
    async fn load(&mut self, url: &str) -> Result<(), CrawlerError>;

    /// Waits until `selector` matches something, giving up after `timeout`.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), CrawlerError>;

    async fn click(&mut self, element: &Element) -> Result<(), CrawlerError>;

    /// Opens an auxiliary browsing context and makes it the active one.
    async fn open_context(&mut self) -> Result<(), CrawlerError>;

    /// Closes the active auxiliary context and switches back to the previous one.
    async fn close_context(&mut self) -> Result<(), CrawlerError>;

    fn current_url(&self) -> Option<&str>;
}

/// Owned snapshot of one rendered element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    html: String,
}

impl Element {
    pub fn from_html<S: Into<String>>(html: S) -> Self {
        Element { html: html.into() }
    }

    pub(crate) fn from_ref(el: ElementRef<'_>) -> Self {
        Element { html: el.html() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn text(&self) -> String {
        self.with_root(|el| utils::collapse_whitespace(el.text()))
            .unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_root(|el| el.value().attr(name).map(ToString::to_string))
            .flatten()
    }

    fn with_root<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> Option<R> {
        let (open, close, depth) = table_context(&self.html);
        let fragment = Html::parse_fragment(&format!("{}{}{}", open, self.html, close));
        let mut root = first_child(fragment.root_element())?;
        for _ in 0..depth {
            root = first_child(root)?;
        }
        Some(f(root))
    }
}

fn first_child(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.children().find_map(ElementRef::wrap)
}

// Outside a table the parser drops table parts, so a snapshot of one gets its
// ancestors back: opening tags, closing tags, and how many levels they add.
fn table_context(html: &str) -> (&'static str, &'static str, usize) {
    let tag = regex_captures!(r"^\s*<([a-zA-Z][a-zA-Z0-9]*)", html)
        .map(|(_, tag)| tag.to_ascii_lowercase());
    match tag.as_deref() {
        Some("td" | "th") => ("<table><tbody><tr>", "</tr></tbody></table>", 3),
        Some("tr") => ("<table><tbody>", "</tbody></table>", 2),
        Some("col") => ("<table><colgroup>", "</colgroup></table>", 2),
        Some("tbody" | "thead" | "tfoot" | "caption" | "colgroup") => ("<table>", "</table>", 1),
        _ => ("", "", 0),
    }
}

impl Scope for Element {
    fn find(&self, selector: &str) -> Option<Element> {
        let selector = parse_selector(selector)?;
        self.with_root(|root| select_below(root, &selector).next())
            .flatten()
    }

    fn find_all(&self, selector: &str) -> Vec<Element> {
        match parse_selector(selector) {
            Some(selector) => self
                .with_root(|root| select_below(root, &selector).collect())
                .unwrap_or_default(),
            None => vec![],
        }
    }
}

pub(crate) fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(_) => {
            warn!("Invalid selector `{}`", selector);
            None
        }
    }
}

// Matches strictly inside `root`; the element itself never matches its own query.
fn select_below<'a>(
    root: ElementRef<'a>,
    selector: &'a Selector,
) -> impl Iterator<Item = Element> + 'a {
    root.select(selector)
        .filter(move |el| el.id() != root.id())
        .map(Element::from_ref)
}
