use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::feed::{FeedType, ScrapedFeed};

/// Fields written on create and on re-scrape.
#[derive(Debug, Clone)]
pub struct FeedRecord {
    pub country_id: Uuid,
    pub url: String,
    pub feed_type: FeedType,
    pub content: String,
}

#[async_trait]
pub trait ScrapedFeedRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ScrapedFeed>, AppError>;

    async fn find(&self, id: i64) -> Result<Option<ScrapedFeed>, AppError>;

    async fn create(&self, record: FeedRecord) -> Result<ScrapedFeed, AppError>;

    async fn update(&self, id: i64, record: FeedRecord) -> Result<Option<ScrapedFeed>, AppError>;

    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

pub struct PgScrapedFeedRepository {
    pool: PgPool,
}

impl PgScrapedFeedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScrapedFeedRepository for PgScrapedFeedRepository {
    async fn list(&self) -> Result<Vec<ScrapedFeed>, AppError> {
        Ok(
            sqlx::query_as::<_, ScrapedFeed>("SELECT * FROM scraped_feeds ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find(&self, id: i64) -> Result<Option<ScrapedFeed>, AppError> {
        Ok(
            sqlx::query_as::<_, ScrapedFeed>("SELECT * FROM scraped_feeds WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create(&self, record: FeedRecord) -> Result<ScrapedFeed, AppError> {
        Ok(sqlx::query_as::<_, ScrapedFeed>(
            r#"
            INSERT INTO scraped_feeds (country_id, url, feed_type, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(record.country_id)
        .bind(&record.url)
        .bind(record.feed_type)
        .bind(&record.content)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(&self, id: i64, record: FeedRecord) -> Result<Option<ScrapedFeed>, AppError> {
        Ok(sqlx::query_as::<_, ScrapedFeed>(
            r#"
            UPDATE scraped_feeds
            SET country_id = $2, url = $3, feed_type = $4, content = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(record.country_id)
        .bind(&record.url)
        .bind(record.feed_type)
        .bind(&record.content)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM scraped_feeds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
