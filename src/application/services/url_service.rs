//! Short URL creation, listing and deletion.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::{NewUrlRecord, UrlRecord};
use crate::domain::repositories::{UrlRepository, constraints};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheBatch, CacheService, keys};
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_validator::validate_origin_url;

/// Maximum number of candidate codes tried before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Service owning the write side of short URLs.
///
/// Shortening never touches the cache; it is populated lazily by
/// [`super::ResolutionService`]. Deletion invalidates the cache entries of
/// the deleted codes before returning.
pub struct UrlService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    generator: Arc<dyn CodeGenerator>,
    own_domain: String,
    base_url: String,
}

impl<R: UrlRepository + ?Sized> UrlService<R> {
    /// Creates a new URL service.
    ///
    /// # Arguments
    ///
    /// - `own_domain` - host of this service; URLs pointing at it are refused
    /// - `base_url` - public prefix used to build short URLs
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn CacheService>,
        generator: Arc<dyn CodeGenerator>,
        own_domain: String,
        base_url: String,
    ) -> Self {
        Self {
            repository,
            cache,
            generator,
            own_domain,
            base_url,
        }
    }

    /// Returns the short code for `origin_url` under `owner`, creating it if needed.
    ///
    /// # Idempotence
    ///
    /// Shortening the same URL twice for the same owner returns the same code
    /// and writes nothing the second time. If a concurrent request for the
    /// same pair wins the insert, its code is returned.
    ///
    /// # Code Generation
    ///
    /// A short code collision retries with a fresh candidate, at most
    /// [`MAX_CODE_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is rejected (see
    /// [`validate_origin_url`]).
    /// Returns [`AppError::Conflict`] with reason `code_space_exhausted` if
    /// every attempt collided.
    /// Returns [`AppError::Internal`] if the entropy source fails.
    pub async fn shorten(&self, owner: Uuid, origin_url: &str) -> Result<String, AppError> {
        let origin_url = validate_origin_url(origin_url, &self.own_domain)?;

        if let Some(existing) = self
            .repository
            .find_by_owner_and_origin(owner, &origin_url)
            .await?
        {
            return Ok(existing.short_code);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let short_code = self.generator.generate()?;

            let new_url = NewUrlRecord {
                short_code,
                origin_url: origin_url.clone(),
                owner,
            };

            match self.repository.create_url(new_url).await {
                Ok(record) => {
                    info!(short_code = %record.short_code, %owner, "Short URL created");
                    return Ok(record.short_code);
                }
                Err(e) if e.is_conflict_on(constraints::URLS_PKEY) => {
                    warn!(attempt, "Short code collision, retrying");
                }
                Err(e) if e.is_conflict_on(constraints::URLS_OWNER_ORIGIN) => {
                    if let Some(winner) = self
                        .repository
                        .find_by_owner_and_origin(owner, &origin_url)
                        .await?
                    {
                        return Ok(winner.short_code);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(
            "Could not allocate a unique short code",
            json!({ "reason": "code_space_exhausted", "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), short_code)
    }

    /// Returns the record behind `short_code` if `owner` owns it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code does not exist or belongs to
    /// someone else; the two cases are indistinguishable to the caller.
    pub async fn get_owned(&self, owner: Uuid, short_code: &str) -> Result<UrlRecord, AppError> {
        self.repository
            .find_by_code(short_code)
            .await?
            .filter(|record| record.owner == owner)
            .ok_or_else(|| not_found(short_code))
    }

    /// Lists `owner`'s URLs, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the requested page is empty.
    pub async fn list(
        &self,
        owner: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<(i64, Vec<UrlRecord>), AppError> {
        let (total, records) = self.repository.list_by_owner(owner, offset, limit).await?;

        if records.is_empty() {
            return Err(AppError::not_found(
                "No URLs found",
                json!({ "offset": offset, "limit": limit }),
            ));
        }

        Ok((total, records))
    }

    /// Deletes one of `owner`'s URLs and invalidates its cache entries.
    ///
    /// The resolved-url and counter keys are removed before this returns, so
    /// a later resolution of the code reaches the store and gets `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code does not exist or is not owned by `owner`.
    pub async fn delete(&self, owner: Uuid, short_code: &str) -> Result<(), AppError> {
        match self.repository.find_by_code(short_code).await? {
            Some(record) if record.owner == owner => {
                self.repository.delete_url(short_code).await?;
                self.invalidate(&[short_code.to_string()]).await?;
                info!(short_code, %owner, "Short URL deleted");
                Ok(())
            }
            Some(_) => Err(not_found(short_code)),
            None => {
                // A previous delete may have failed between the store and the cache.
                self.invalidate(&[short_code.to_string()]).await?;
                Err(not_found(short_code))
            }
        }
    }

    /// Deletes every URL of `owner` and invalidates their cache entries.
    ///
    /// Returns the number of deleted records.
    pub async fn delete_all(&self, owner: Uuid) -> Result<usize, AppError> {
        let codes = self.repository.delete_by_owner(owner).await?;
        self.invalidate(&codes).await?;

        info!(%owner, count = codes.len(), "Deleted all URLs of owner");
        Ok(codes.len())
    }

    async fn invalidate(&self, codes: &[String]) -> Result<(), AppError> {
        let batch = codes.iter().fold(CacheBatch::new(), |batch, code| {
            batch
                .delete(keys::resolved_url(code))
                .delete(keys::resolution_count(code))
        });

        if !batch.is_empty() {
            self.cache.exec(batch).await?;
        }

        Ok(())
    }
}

fn not_found(short_code: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "code": short_code }))
}
