//! In-process durable store.
//!
//! Used when no `DATABASE_URL` is configured and by the HTTP integration
//! tests. It enforces the same uniqueness constraints as the PostgreSQL
//! schema and reports violations under the same constraint names, so the
//! services behave identically on both backends. Contents are lost on exit.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{NewUrlRecord, NewUser, UrlRecord, User};
use crate::domain::repositories::{UrlRepository, UserRepository, constraints};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    urls: HashMap<String, UrlRecord>,
}

/// Users and URL records behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": constraint }),
    )
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(unique_violation(constraints::USERS_EMAIL));
        }

        let user = User {
            user_id: new_user.user_id,
            email: new_user.email,
            account_type: new_user.account_type,
            password_hash: new_user.password_hash,
            updated_at: Utc::now(),
        };
        tables.users.insert(user.user_id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let existed = tables.users.remove(&user_id).is_some();
        if existed {
            tables.urls.retain(|_, record| record.owner != user_id);
        }

        Ok(existed)
    }
}

#[async_trait]
impl UrlRepository for MemoryStore {
    async fn create_url(&self, new_url: NewUrlRecord) -> Result<UrlRecord, AppError> {
        let mut tables = self.tables.write().await;

        if tables.urls.contains_key(&new_url.short_code) {
            return Err(unique_violation(constraints::URLS_PKEY));
        }
        if tables
            .urls
            .values()
            .any(|r| r.owner == new_url.owner && r.origin_url == new_url.origin_url)
        {
            return Err(unique_violation(constraints::URLS_OWNER_ORIGIN));
        }

        let record = UrlRecord {
            short_code: new_url.short_code,
            origin_url: new_url.origin_url,
            owner: new_url.owner,
            resolution_count: 0,
            updated_at: Utc::now(),
        };
        tables
            .urls
            .insert(record.short_code.clone(), record.clone());

        Ok(record)
    }

    async fn find_by_owner_and_origin(
        &self,
        owner: Uuid,
        origin_url: &str,
    ) -> Result<Option<UrlRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .urls
            .values()
            .find(|r| r.owner == owner && r.origin_url == origin_url)
            .cloned())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.urls.get(short_code).cloned())
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(i64, Vec<UrlRecord>), AppError> {
        let tables = self.tables.read().await;

        let mut owned: Vec<&UrlRecord> = tables.urls.values().filter(|r| r.owner == owner).collect();
        owned.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.short_code.cmp(&b.short_code))
        });

        let total = owned.len() as i64;
        let page = owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();

        Ok((total, page))
    }

    async fn delete_url(&self, short_code: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.urls.remove(short_code).is_some())
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write().await;

        let codes: Vec<String> = tables
            .urls
            .values()
            .filter(|r| r.owner == owner)
            .map(|r| r.short_code.clone())
            .collect();
        for code in &codes {
            tables.urls.remove(code);
        }

        Ok(codes)
    }

    async fn record_resolution_count(
        &self,
        short_code: &str,
        observed: i64,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        match tables.urls.get_mut(short_code) {
            Some(record) => {
                record.resolution_count = record.resolution_count.max(observed);
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}
