#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Json error")]
    JsonError(#[from] serde_json::Error),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Timed out after {timeout:?} waiting for `{selector}`")]
    Timeout {
        selector: String,
        timeout: std::time::Duration,
    },

    #[error("Element is not clickable: {0}")]
    NotClickable(String),

    #[error("No page loaded in the active browsing context")]
    NoPage,

    #[error("No auxiliary browsing context to close")]
    NoAuxiliaryContext,
}

/// Why a listing entry could not become a document.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Title not found")]
    MissingTitle,

    #[error("Link not found for `{0}`")]
    MissingLink(String),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("Empty date text")]
    Empty,

    #[error("Unrecognized date text: {0}")]
    Unrecognized(String),
}
