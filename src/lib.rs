//! Incremental harvester for the European Payments Council document listing.
//!
//! A [`Crawler`] walks the paginated listing, reads every entry's detail page
//! and stops at the first document a previous run already harvested, or once
//! the batch is full.

pub mod config;
pub mod crawler;
pub mod date;
pub mod document;
pub mod extract;
pub mod frontier;
pub mod page;
pub mod policy;
pub mod store;

mod data;
mod error;
mod utils;

#[cfg(test)]
mod testing;

pub use config::{CrawlConfig, ListingMode};
pub use crawler::{CrawlOutcome, Crawler};
pub use data::Table;
pub use document::{Document, IdentityHash, Metadata};
pub use error::{CrawlerError, DateError, ExtractError};
pub use policy::{Decision, HaltReason, StopPolicy};
