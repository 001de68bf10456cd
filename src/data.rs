use crate::{utils, CrawlerError};
use futures::TryStreamExt;
use sqlx::{sqlite::SqliteRow, SqlitePool};
use tracing::debug;

/// A SQLite table keyed by a text `id` column, in insertion order.
#[async_trait::async_trait]
pub trait Table {
    type Record<'a>;
    type Output: Send;

    fn get_name(&self) -> &str;
    fn get_pool(&self) -> &SqlitePool;

    async fn create(&self) -> Result<(), CrawlerError>;
    /// Inserts `record`, replacing any row with the same id.
    async fn upsert<'a>(&self, record: Self::Record<'a>) -> Result<(), CrawlerError>;
    fn decode(row: &SqliteRow) -> Result<Self::Output, CrawlerError>;

    async fn create_if_missing(&self) -> Result<(), CrawlerError> {
        if utils::is_table_exists(self.get_pool(), self.get_name()).await? {
            debug!("Use table {}", self.get_name());
        } else {
            debug!("Create table {}", self.get_name());
            self.create().await?;
        }
        Ok(())
    }

    #[cfg(test)]
    async fn is_exist(&self, id: &str) -> Result<bool, CrawlerError> {
        let query = format!("SELECT id FROM {} WHERE id = ?", self.get_name());
        Ok(sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .is_some())
    }

    #[cfg(test)]
    async fn count(&self) -> Result<u32, CrawlerError> {
        use sqlx::Row;
        let query = format!("SELECT COUNT(*) FROM {}", self.get_name());
        Ok(sqlx::query(&query)
            .fetch_one(self.get_pool())
            .await?
            .try_get(0)?)
    }

    /// The most recently written row.
    async fn latest(&self) -> Result<Option<Self::Output>, CrawlerError> {
        let query = format!("SELECT * FROM {} ORDER BY rowid DESC LIMIT 1", self.get_name());
        let mut rows = sqlx::query(&query).fetch(self.get_pool());
        match rows.try_next().await? {
            Some(row) => Ok(Some(Self::decode(&row)?)),
            None => Ok(None),
        }
    }
}
