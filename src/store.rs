use crate::{
    data::Table,
    document::{Document, IdentityHash, Metadata},
    utils, CrawlerError,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteRow},
    Row, SqlitePool,
};

pub struct DocumentTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for DocumentTable {
    type Record<'a> = &'a Document;
    type Output = Document;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), CrawlerError> {
        let query = format!(
            r#"
                CREATE TABLE {} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    abstract TEXT,
                    body_text TEXT,
                    web_link TEXT NOT NULL,
                    local_link TEXT,
                    metadata TEXT NOT NULL,
                    published_at DATETIME NOT NULL,
                    fetched_at DATETIME,
                    created_at DATETIME
                )
            "#,
            &self.name
        );
        sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        Ok(())
    }

    async fn upsert<'a>(&self, doc: Self::Record<'a>) -> Result<(), CrawlerError> {
        let metadata = serde_json::to_string(&doc.metadata)?;
        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            r#"INSERT OR REPLACE INTO {} (
                id,
                title,
                abstract,
                body_text,
                web_link,
                local_link,
                metadata,
                published_at,
                fetched_at,
                created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.name
        );
        sqlx::query(&query)
            .bind(doc.identity_hash.as_str())
            .bind(doc.title.as_str())
            .bind(doc.abstract_text.as_deref())
            .bind(doc.body_text.as_deref())
            .bind(doc.web_link.as_str())
            .bind(doc.local_link.as_deref())
            .bind(metadata)
            .bind(doc.published_at)
            .bind(doc.fetched_at)
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    fn decode(row: &SqliteRow) -> Result<Document, CrawlerError> {
        let metadata: String = row.try_get("metadata")?;
        let metadata: Metadata = serde_json::from_str(&metadata)?;
        let title: String = row.try_get("title")?;
        let web_link: String = row.try_get("web_link")?;

        Ok(Document {
            identity_hash: IdentityHash::new(&title, &web_link),
            title,
            abstract_text: row.try_get("abstract")?,
            body_text: row.try_get("body_text")?,
            web_link,
            local_link: row.try_get("local_link")?,
            metadata,
            published_at: row.try_get::<NaiveDateTime, _>("published_at")?,
            fetched_at: row.try_get::<Option<DateTime<Utc>>, _>("fetched_at")?,
        })
    }
}

/// Documents harvested by earlier runs, newest listing entry last.
pub struct DocumentStore {
    pub name: String,
    pub documents: DocumentTable,
}

impl DocumentStore {
    pub async fn new(name: &str) -> Result<DocumentStore, CrawlerError> {
        let opt = SqliteConnectOptions::new()
            .filename(format!("{}.db", name))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let store = DocumentStore {
            name: name.to_string(),
            documents: DocumentTable {
                name: format!("{}_documents", name),
                pool,
            },
        };
        store.documents.create_if_missing().await?;
        Ok(store)
    }

    /// Saves a batch in listing order, which runs newest first.
    pub async fn insert_batch(&self, docs: &[Document]) -> Result<(), CrawlerError> {
        for doc in docs.iter().rev() {
            self.documents.upsert(doc).await?;
        }
        tracing::debug!("Saved {} documents to {}", docs.len(), self.name);
        Ok(())
    }

    /// The newest document seen so far, the cut-off for the next run.
    pub async fn last_document(&self) -> Result<Option<Document>, CrawlerError> {
        self.documents.latest().await
    }
}
