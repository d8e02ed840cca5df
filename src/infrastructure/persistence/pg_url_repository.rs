//! PostgreSQL implementation of URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

/// PostgreSQL repository for short URL records.
///
/// Both uniqueness invariants (`urls_pkey`, `urls_owner_origin_url_key`) are
/// table constraints, so concurrent creates are arbitrated by the database.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UrlRow {
    short_code: String,
    origin_url: String,
    owner: Uuid,
    resolution_count: i64,
    updated_at: DateTime<Utc>,
}

impl From<UrlRow> for UrlRecord {
    fn from(row: UrlRow) -> Self {
        UrlRecord {
            short_code: row.short_code,
            origin_url: row.origin_url,
            owner: row.owner,
            resolution_count: row.resolution_count,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create_url(&self, new_url: NewUrlRecord) -> Result<UrlRecord, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            INSERT INTO urls (short_code, origin_url, owner)
            VALUES ($1, $2, $3)
            RETURNING short_code, origin_url, owner, resolution_count, updated_at
            "#,
        )
        .bind(&new_url.short_code)
        .bind(&new_url.origin_url)
        .bind(new_url.owner)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_owner_and_origin(
        &self,
        owner: Uuid,
        origin_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT short_code, origin_url, owner, resolution_count, updated_at
            FROM urls
            WHERE owner = $1 AND origin_url = $2
            "#,
        )
        .bind(owner)
        .bind(origin_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT short_code, origin_url, owner, resolution_count, updated_at
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(i64, Vec<UrlRecord>), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls WHERE owner = $1")
            .bind(owner)
            .fetch_one(self.pool.as_ref())
            .await?;

        let rows = sqlx::query_as::<_, UrlRow>(
            r#"
            SELECT short_code, origin_url, owner, resolution_count, updated_at
            FROM urls
            WHERE owner = $1
            ORDER BY updated_at DESC, short_code
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok((total, rows.into_iter().map(Into::into).collect()))
    }

    async fn delete_url(&self, short_code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE short_code = $1")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<Vec<String>, AppError> {
        let codes = sqlx::query_scalar::<_, String>(
            "DELETE FROM urls WHERE owner = $1 RETURNING short_code",
        )
        .bind(owner)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }

    async fn record_resolution_count(
        &self,
        short_code: &str,
        observed: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE urls
            SET resolution_count = GREATEST(resolution_count, $2),
                updated_at = NOW()
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .bind(observed)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
