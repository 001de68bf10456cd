//! Field extraction for listing entries and detail pages.
//!
//! The site renders the same content under several templates, so every field
//! is resolved by an ordered list of strategies and the first hit wins.

use crate::{
    date,
    document::{Document, Metadata},
    error::ExtractError,
    page::{Element, Scope},
};
use reqwest::Url;
use tracing::debug;

pub type Strategy<T> = fn(&dyn Scope) -> Option<T>;

/// Container that holds the listing entries once the listing has rendered.
pub const LISTING_CONTAINER: &str = ".view-content";
pub const LISTING_ENTRY: &str = "article";

const TITLE: &[Strategy<Element>] = &[kb_title, well_heading];
const DOC_TYPE: &[Strategy<String>] = &[kb_type, news_type, label_alt];
const DATE_TEXT: &[Strategy<String>] = &[intro_date, created_field];
const TAGS: &[Strategy<String>] = &[kb_tags];
const BODY: &[Strategy<String>] = &[
    details_paragraph,
    details_container,
    two_column,
    article_content,
];

/// Runs `strategies` in order against `scope`, returning the first hit.
pub fn first_of<T>(scope: &dyn Scope, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(scope))
}

fn text_of(scope: &dyn Scope, selector: &str) -> Option<String> {
    scope
        .find(selector)
        .map(|el| el.text())
        .filter(|text| !text.is_empty())
}

fn kb_title(scope: &dyn Scope) -> Option<Element> {
    scope.find(".kb-title")
}

fn well_heading(scope: &dyn Scope) -> Option<Element> {
    scope.find(".well").and_then(|well| well.find("h2"))
}

fn kb_type(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".kb-type")
}

fn news_type(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".news-type")
}

fn label_alt(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".label-alt")
}

fn intro_date(scope: &dyn Scope) -> Option<String> {
    scope
        .find(".kb-intro")
        .and_then(|intro| text_of(&intro, ".date"))
}

fn created_field(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".field--created")
}

fn kb_tags(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".kb-tags")
}

fn details_paragraph(scope: &dyn Scope) -> Option<String> {
    scope
        .find(".content-container-details")
        .and_then(|details| text_of(&details, "p"))
}

fn details_container(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".content-container-details")
}

fn two_column(scope: &dyn Scope) -> Option<String> {
    text_of(scope, ".col-md-6")
}

fn article_content(scope: &dyn Scope) -> Option<String> {
    scope
        .find("article")
        .and_then(|article| text_of(&article, ".content"))
}

/// Turns one listing entry into a document that still lacks its body.
///
/// `base` resolves relative links; links that cannot be made absolute count as
/// missing.
pub fn listing_document(entry: &Element, base: Option<&Url>) -> Result<Document, ExtractError> {
    let title_el = first_of(entry, TITLE).ok_or(ExtractError::MissingTitle)?;
    let title = title_el.text();
    if title.is_empty() {
        return Err(ExtractError::MissingTitle);
    }

    let web_link = title_el
        .find("a")
        .and_then(|a| a.attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .and_then(|href| absolute(&href, base))
        .ok_or_else(|| ExtractError::MissingLink(title.clone()))?;

    let date_text = first_of(entry, DATE_TEXT).unwrap_or_else(|| date::SENTINEL_TEXT.to_string());
    let published_at = date::normalize(&date_text).unwrap_or_else(|e| {
        debug!("Keep sentinel date for `{}`: {}", title, e);
        date::sentinel()
    });

    let metadata = Metadata {
        doc_type: first_of(entry, DOC_TYPE),
        tags: first_of(entry, TAGS),
        ..Metadata::default()
    };

    Ok(Document::new(title, web_link, metadata, published_at))
}

/// Body text of a detail page, or an empty string when no template matched.
pub fn body_text(page: &dyn Scope) -> String {
    first_of(page, BODY).unwrap_or_default()
}

fn absolute(href: &str, base: Option<&Url>) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
    .map(String::from)
}
