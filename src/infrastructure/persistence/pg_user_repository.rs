//! PostgreSQL implementation of user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{AccountType, NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// PostgreSQL repository for accounts.
///
/// Email uniqueness is enforced by the `users_email_key` constraint; a
/// violation surfaces as [`AppError::Conflict`] through `From<sqlx::Error>`.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    account_type: String,
    password_hash: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let account_type = row.account_type.parse::<AccountType>().map_err(|e| {
            AppError::internal("Corrupt user row", json!({ "reason": e, "user_id": row.user_id }))
        })?;

        Ok(User {
            user_id: row.user_id,
            email: row.email,
            account_type,
            password_hash: row.password_hash,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (user_id, email, account_type, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, account_type, password_hash, updated_at
            "#,
        )
        .bind(new_user.user_id)
        .bind(&new_user.email)
        .bind(new_user.account_type.as_str())
        .bind(&new_user.password_hash)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, account_type, password_hash, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, account_type, password_hash, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
