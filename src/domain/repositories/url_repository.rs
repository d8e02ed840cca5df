//! Repository trait for shortened URLs.

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository interface for URL records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Creates a URL record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if:
    /// - The short code is taken (constraint `urls_pkey`)
    /// - The owner already shortened this origin URL (constraint `urls_owner_origin_url_key`)
    async fn create_url(&self, new_url: NewUrlRecord) -> Result<UrlRecord, AppError>;

    /// Finds the record an owner created for an origin URL, if any.
    async fn find_by_owner_and_origin(
        &self,
        owner: Uuid,
        origin_url: &str,
    ) -> Result<Option<UrlRecord>, AppError>;

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError>;

    /// Lists an owner's records, most recently updated first.
    ///
    /// Returns the owner's total record count alongside the requested page.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(i64, Vec<UrlRecord>), AppError>;

    /// Hard-deletes a record. Returns `Ok(false)` if no such record existed.
    async fn delete_url(&self, short_code: &str) -> Result<bool, AppError>;

    /// Deletes every record of `owner` and returns the deleted short codes.
    async fn delete_by_owner(&self, owner: Uuid) -> Result<Vec<String>, AppError>;

    /// Raises the stored resolution count to `observed` if it is higher.
    ///
    /// Counts never decrease, so replayed or reordered flushes are harmless.
    /// Returns `Ok(false)` if the record no longer exists.
    async fn record_resolution_count(
        &self,
        short_code: &str,
        observed: i64,
    ) -> Result<bool, AppError>;

    /// Checks if the store is reachable.
    async fn health_check(&self) -> bool;
}
