use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::country::{Country, CountryDetails, SectionKey};

#[async_trait]
pub trait CountryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Country>, AppError>;

    /// Fails with `Conflict` if a country with the same name or code exists.
    async fn create(&self, details: &CountryDetails) -> Result<Country, AppError>;

    /// Replaces name, code and embassy URLs. `None` if the country does not exist.
    async fn update_details(
        &self,
        id: Uuid,
        details: &CountryDetails,
    ) -> Result<Option<Country>, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Country>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError>;

    /// Overwrites one section. Returns false if the country does not exist.
    async fn update_section(
        &self,
        id: Uuid,
        section: SectionKey,
        content: &str,
    ) -> Result<bool, AppError>;
}

pub struct PgCountryRepository {
    pool: PgPool,
}

impl PgCountryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CountryRepository for PgCountryRepository {
    async fn list(&self) -> Result<Vec<Country>, AppError> {
        Ok(
            sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create(&self, details: &CountryDetails) -> Result<Country, AppError> {
        let country = Country::new(details.clone());
        let inserted = sqlx::query_as::<_, Country>(
            r#"
            INSERT INTO countries
                (id, name, code, embassy_in_us_url, us_embassy_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(country.id)
        .bind(&country.name)
        .bind(&country.code)
        .bind(&country.embassy_in_us_url)
        .bind(&country.us_embassy_url)
        .bind(country.created_at)
        .bind(country.updated_at)
        .fetch_one(&self.pool)
        .await;

        inserted.map_err(|e| duplicate_to_conflict(e, details))
    }

    async fn update_details(
        &self,
        id: Uuid,
        details: &CountryDetails,
    ) -> Result<Option<Country>, AppError> {
        sqlx::query_as::<_, Country>(
            r#"
            UPDATE countries
            SET name = $1, code = $2, embassy_in_us_url = $3, us_embassy_url = $4,
                updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&details.name)
        .bind(&details.code)
        .bind(&details.embassy_in_us_url)
        .bind(&details.us_embassy_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_to_conflict(e, details))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Country>, AppError> {
        Ok(
            sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError> {
        Ok(
            sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE name = $1 LIMIT 1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_section(
        &self,
        id: Uuid,
        section: SectionKey,
        content: &str,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "UPDATE countries SET {} = $1, updated_at = now() WHERE id = $2",
            section.column()
        );
        let result = sqlx::query(&sql)
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn duplicate_to_conflict(e: sqlx::Error, details: &CountryDetails) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "A country named '{}' or with code '{}' already exists",
            details.name, details.code
        )),
        e => e.into(),
    }
}
