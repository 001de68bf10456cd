use crate::error::DateError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_regex::regex;
use lazy_static::lazy_static;
use std::borrow::Borrow;

/// Text substituted upstream when an entry shows no date at all.
pub const SENTINEL_TEXT: &str = "2000-01-01";

lazy_static! {
    static ref SENTINEL: NaiveDateTime = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid sentinel date");
}

// Day-first before month-first: the site is European.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %B %Y - %H:%M",
    "%B %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d/%m/%y",
];

pub fn sentinel() -> NaiveDateTime {
    *SENTINEL
}

/// Converts loosely formatted date text into a timestamp.
///
/// Labels such as `Created:`, leading weekday names and ordinal suffixes are
/// ignored. Dates without a time of day land on midnight.
pub fn normalize(text: &str) -> Result<NaiveDateTime, DateError> {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return Err(DateError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&cleaned) {
        return Ok(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(&cleaned, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(&cleaned, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DateError::Unrecognized(text.trim().to_string()))
}

fn clean(text: &str) -> String {
    let s = regex!(r"\s+").replace_all(text.trim(), " ");
    let s = regex!(r"(?i)^[a-z][a-z ]*:\s*").replace(s.borrow(), "");
    let s = regex!(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").replace(s.borrow(), "");
    let s = regex!(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").replace_all(s.borrow(), "$1");
    s.trim().to_string()
}
