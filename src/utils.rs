use chrono::{DateTime, Utc};
use itertools::Itertools;
use sqlx::SqlitePool;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

pub(crate) fn get_now() -> DateTime<Utc> {
    Utc::now()
}

/// Rendered text the way a browser reports it: text nodes are joined as they
/// stand, then runs of whitespace become one space.
pub(crate) fn collapse_whitespace<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts
        .into_iter()
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}
