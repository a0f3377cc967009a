//! Persistence for generation jobs.
//!
//! Every status transition is a conditional single-row UPDATE so that a
//! terminal record (`SAVED`, `ERROR`) can never be rewritten.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::generation::{GenerationJob, GenerationStatus};

#[async_trait]
pub trait GenerationRepository: Send + Sync {
    async fn insert(&self, job: &GenerationJob) -> Result<(), AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<GenerationJob>, AppError>;

    /// `PENDING → COMPLETED`. Returns false if the job was not pending.
    async fn mark_completed(&self, id: Uuid, content: &str) -> Result<bool, AppError>;

    /// `PENDING → ERROR`. Returns false if the job was not pending.
    async fn mark_error(&self, id: Uuid, error: &str) -> Result<bool, AppError>;

    async fn list_for_country(
        &self,
        country_name: &str,
        statuses: &[GenerationStatus],
    ) -> Result<Vec<GenerationJob>, AppError>;

    /// Atomically copies the job's content into the country's section column and
    /// moves the job `COMPLETED → SAVED`.
    ///
    /// Fails with `Conflict` if the job is not `COMPLETED`, `NotFound` if the
    /// country does not exist; either way nothing is written.
    async fn commit(&self, id: Uuid, country_id: Uuid) -> Result<GenerationJob, AppError>;

    /// Moves every `PENDING` job to `ERROR` with the given message.
    async fn fail_pending(&self, error: &str) -> Result<u64, AppError>;
}

pub struct PgGenerationRepository {
    pool: PgPool,
}

impl PgGenerationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationRepository for PgGenerationRepository {
    async fn insert(&self, job: &GenerationJob) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO content_generations
                (id, country_name, section, status, content, error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job.id)
        .bind(&job.country_name)
        .bind(job.section)
        .bind(job.status)
        .bind(&job.content)
        .bind(&job.error)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<GenerationJob>, AppError> {
        Ok(
            sqlx::query_as::<_, GenerationJob>("SELECT * FROM content_generations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn mark_completed(&self, id: Uuid, content: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE content_generations
            SET status = 'COMPLETED', content = $2, error = NULL, updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_error(&self, id: Uuid, error: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE content_generations
            SET status = 'ERROR', error = $2, content = NULL, updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_for_country(
        &self,
        country_name: &str,
        statuses: &[GenerationStatus],
    ) -> Result<Vec<GenerationJob>, AppError> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        Ok(sqlx::query_as::<_, GenerationJob>(
            r#"
            SELECT * FROM content_generations
            WHERE country_name = $1 AND status = ANY($2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(country_name)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn commit(&self, id: Uuid, country_id: Uuid) -> Result<GenerationJob, AppError> {
        let mut tx = self.pool.begin().await?;

        let job: Option<GenerationJob> = sqlx::query_as(
            r#"
            UPDATE content_generations
            SET status = 'SAVED', updated_at = now()
            WHERE id = $1 AND status = 'COMPLETED'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping `tx` on any early return rolls the status change back.
        let job = job.ok_or_else(|| AppError::Conflict(format!("Generation {id} is not COMPLETED")))?;
        let content = job.content.clone().unwrap_or_default();

        let sql = format!(
            "UPDATE countries SET {} = $1, updated_at = now() WHERE id = $2",
            job.section.column()
        );
        let updated = sqlx::query(&sql)
            .bind(&content)
            .bind(country_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Country {country_id} not found")));
        }

        tx.commit().await?;
        Ok(job)
    }

    async fn fail_pending(&self, error: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE content_generations
            SET status = 'ERROR', error = $1, updated_at = now()
            WHERE status = 'PENDING'
            "#,
        )
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
