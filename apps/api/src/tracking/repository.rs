use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::tracking::{
    EmergencyNumber, EmergencyNumberDraft, GovernmentEntity, GovernmentEntityDraft, Influencer,
    InfluencerDraft, Keyword, KeywordList, Leader, LeaderDraft, NewsSource, NewsSourceDraft,
    Presence, PresenceKind, TrackedList,
};

/// Storage for the per-country monitoring lists and presence handles.
///
/// Lists come back oldest first. Batch inserts are all-or-nothing.
#[async_trait]
pub trait TrackingRepository: Send + Sync {
    async fn list_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
    ) -> Result<Vec<Keyword>, AppError>;

    async fn add_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
        keywords: &[String],
    ) -> Result<Vec<Keyword>, AppError>;

    async fn list_news_sources(&self, country_id: Uuid) -> Result<Vec<NewsSource>, AppError>;

    async fn add_news_sources(
        &self,
        country_id: Uuid,
        drafts: &[NewsSourceDraft],
    ) -> Result<Vec<NewsSource>, AppError>;

    async fn list_influencers(&self, country_id: Uuid) -> Result<Vec<Influencer>, AppError>;

    async fn add_influencers(
        &self,
        country_id: Uuid,
        drafts: &[InfluencerDraft],
    ) -> Result<Vec<Influencer>, AppError>;

    async fn list_government_entities(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<GovernmentEntity>, AppError>;

    async fn add_government_entities(
        &self,
        country_id: Uuid,
        drafts: &[GovernmentEntityDraft],
    ) -> Result<Vec<GovernmentEntity>, AppError>;

    async fn list_leaders(&self, country_id: Uuid) -> Result<Vec<Leader>, AppError>;

    async fn add_leaders(
        &self,
        country_id: Uuid,
        drafts: &[LeaderDraft],
    ) -> Result<Vec<Leader>, AppError>;

    async fn list_emergency_numbers(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<EmergencyNumber>, AppError>;

    async fn add_emergency_numbers(
        &self,
        country_id: Uuid,
        drafts: &[EmergencyNumberDraft],
    ) -> Result<Vec<EmergencyNumber>, AppError>;

    /// Removes one item from a list. Returns false if it was not in this country's list.
    async fn delete_item(
        &self,
        list: TrackedList,
        country_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, AppError>;

    async fn get_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<Option<Presence>, AppError>;

    /// Stores the handle, replacing any previous one of the same kind.
    async fn set_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
        handle: &str,
    ) -> Result<Presence, AppError>;

    async fn delete_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<bool, AppError>;
}

pub struct PgTrackingRepository {
    pool: PgPool,
}

impl PgTrackingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list<T>(&self, list: TrackedList, country_id: Uuid) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE country_id = $1 ORDER BY created_at ASC",
            list.table()
        );
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(country_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TrackingRepository for PgTrackingRepository {
    async fn list_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
    ) -> Result<Vec<Keyword>, AppError> {
        self.list(list.tracked(), country_id).await
    }

    async fn add_keywords(
        &self,
        country_id: Uuid,
        list: KeywordList,
        keywords: &[String],
    ) -> Result<Vec<Keyword>, AppError> {
        let sql = format!(
            "INSERT INTO {} (id, country_id, keyword, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
            list.tracked().table()
        );
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            created.push(
                sqlx::query_as::<_, Keyword>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(country_id)
                    .bind(keyword)
                    .bind(Utc::now())
                    .fetch_one(&mut *tx)
                    .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_news_sources(&self, country_id: Uuid) -> Result<Vec<NewsSource>, AppError> {
        self.list(TrackedList::NewsSources, country_id).await
    }

    async fn add_news_sources(
        &self,
        country_id: Uuid,
        drafts: &[NewsSourceDraft],
    ) -> Result<Vec<NewsSource>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                sqlx::query_as::<_, NewsSource>(
                    r#"
                    INSERT INTO news_sources (id, country_id, name, url, notes, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(country_id)
                .bind(&draft.name)
                .bind(&draft.url)
                .bind(&draft.notes)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_influencers(&self, country_id: Uuid) -> Result<Vec<Influencer>, AppError> {
        self.list(TrackedList::Influencers, country_id).await
    }

    async fn add_influencers(
        &self,
        country_id: Uuid,
        drafts: &[InfluencerDraft],
    ) -> Result<Vec<Influencer>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                sqlx::query_as::<_, Influencer>(
                    r#"
                    INSERT INTO influencers
                        (id, country_id, name, handle, role, political_leaning, url, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(country_id)
                .bind(&draft.name)
                .bind(&draft.handle)
                .bind(&draft.role)
                .bind(draft.political_leaning)
                .bind(&draft.url)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_government_entities(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<GovernmentEntity>, AppError> {
        self.list(TrackedList::GovernmentMessaging, country_id).await
    }

    async fn add_government_entities(
        &self,
        country_id: Uuid,
        drafts: &[GovernmentEntityDraft],
    ) -> Result<Vec<GovernmentEntity>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                sqlx::query_as::<_, GovernmentEntity>(
                    r#"
                    INSERT INTO government_messaging (id, country_id, name, handle, notes, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(country_id)
                .bind(&draft.name)
                .bind(&draft.handle)
                .bind(&draft.notes)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_leaders(&self, country_id: Uuid) -> Result<Vec<Leader>, AppError> {
        self.list(TrackedList::LeadershipMessaging, country_id).await
    }

    async fn add_leaders(
        &self,
        country_id: Uuid,
        drafts: &[LeaderDraft],
    ) -> Result<Vec<Leader>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                sqlx::query_as::<_, Leader>(
                    r#"
                    INSERT INTO leadership_messaging
                        (id, country_id, name, title, handle, political_leaning, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(country_id)
                .bind(&draft.name)
                .bind(&draft.title)
                .bind(&draft.handle)
                .bind(&draft.political_leaning)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_emergency_numbers(
        &self,
        country_id: Uuid,
    ) -> Result<Vec<EmergencyNumber>, AppError> {
        self.list(TrackedList::EmergencyNumbers, country_id).await
    }

    async fn add_emergency_numbers(
        &self,
        country_id: Uuid,
        drafts: &[EmergencyNumberDraft],
    ) -> Result<Vec<EmergencyNumber>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                sqlx::query_as::<_, EmergencyNumber>(
                    r#"
                    INSERT INTO emergency_numbers (id, country_id, name, number, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(country_id)
                .bind(&draft.name)
                .bind(&draft.number)
                .bind(Utc::now())
                .fetch_one(&mut *tx)
                .await?,
            );
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn delete_item(
        &self,
        list: TrackedList,
        country_id: Uuid,
        item_id: Uuid,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND country_id = $2",
            list.table()
        );
        let result = sqlx::query(&sql)
            .bind(item_id)
            .bind(country_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<Option<Presence>, AppError> {
        Ok(sqlx::query_as::<_, Presence>(
            "SELECT * FROM presences WHERE country_id = $1 AND kind = $2",
        )
        .bind(country_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
        handle: &str,
    ) -> Result<Presence, AppError> {
        Ok(sqlx::query_as::<_, Presence>(
            r#"
            INSERT INTO presences (country_id, kind, handle, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (country_id, kind)
            DO UPDATE SET handle = EXCLUDED.handle, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(country_id)
        .bind(kind)
        .bind(handle)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_presence(
        &self,
        country_id: Uuid,
        kind: PresenceKind,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM presences WHERE country_id = $1 AND kind = $2")
            .bind(country_id)
            .bind(kind)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
