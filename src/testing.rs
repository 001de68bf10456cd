use crate::{
    page::{Element, Fetch},
    CrawlerError,
};
use reqwest::Url;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// In-memory web site serving fixed HTML per URL and recording every fetch.
#[derive(Debug, Default, Clone)]
pub(crate) struct Site {
    pages: HashMap<String, String>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl Site {
    pub(crate) fn page<S: Into<String>>(mut self, url: &str, html: S) -> Self {
        let url = Url::parse(url).expect("Invalid test url");
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetch for Site {
    async fn fetch(&self, url: &Url) -> Result<String, CrawlerError> {
        self.visits.lock().unwrap().push(url.to_string());
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| CrawlerError::PageNotFound(url.to_string()))
    }
}

pub(crate) fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/htmls/{}", name)).expect("Invalid file path")
}

/// A whole fixture page as one element.
///
/// Fragment parsing keeps only the first top-level element, so the page is
/// wrapped before parsing.
pub(crate) fn fixture_element(name: &str) -> Element {
    Element::from_html(format!("<div>{}</div>", fixture(name)))
}
