//! Cache-aside resolution of short codes.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::entities::UrlRecord;
use crate::domain::repositories::UrlRepository;
use crate::domain::resolution_event::ResolutionEvent;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, keys};

/// Read path for redirects.
///
/// # Request Flow
///
/// 1. `GET resolved-url:<code>`; a hit returns without touching the store
/// 2. On a miss, look the code up in the store; absent means `NotFound`
///    (never cached, so a code created a moment later resolves at once)
/// 3. Store hit populates the cache with the configured TTL
/// 4. `INCR resolution-count:<code>` and publish the new total to the
///    resolution worker. A counter that was missing is first raised by the
///    stored total, so the cache never reports less than the store.
///
/// A cache read failure falls back to the store. Populate and counter
/// failures are logged and never fail the redirect.
pub struct ResolutionService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    cache: Arc<dyn CacheService>,
    cache_ttl: Duration,
    events: mpsc::Sender<ResolutionEvent>,
}

impl<R: UrlRepository + ?Sized> ResolutionService<R> {
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn CacheService>,
        cache_ttl: Duration,
        events: mpsc::Sender<ResolutionEvent>,
    ) -> Self {
        Self {
            repository,
            cache,
            cache_ttl,
            events,
        }
    }

    /// Resolves `short_code` to its origin URL and counts the resolution.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record exists for the code.
    /// Returns [`AppError::Unavailable`] or [`AppError::Internal`] if the
    /// store has to be consulted and fails.
    pub async fn resolve(&self, short_code: &str) -> Result<String, AppError> {
        let cache_key = keys::resolved_url(short_code);

        // Set on the store path so a fresh counter can be seeded without a second lookup.
        let mut stored_count = None;

        let origin_url = match self.cache.get(&cache_key).await {
            Ok(Some(url)) => {
                metrics::counter!("cache_hits_total").increment(1);
                debug!("Cache HIT for {}", cache_key);
                url
            }
            Ok(None) => {
                metrics::counter!("cache_misses_total").increment(1);
                debug!("Cache MISS for {}", cache_key);

                let record = self.load(short_code).await?;
                if let Err(e) = self
                    .cache
                    .set(&cache_key, &record.origin_url, self.cache_ttl)
                    .await
                {
                    warn!("Failed to cache {}: {}", cache_key, e);
                }
                stored_count = Some(record.resolution_count);
                record.origin_url
            }
            Err(e) => {
                warn!("Cache error, falling back to store: {}", e);
                let record = self.load(short_code).await?;
                stored_count = Some(record.resolution_count);
                record.origin_url
            }
        };

        self.count(short_code, stored_count).await;
        metrics::counter!("resolutions_total").increment(1);

        Ok(origin_url)
    }

    /// Reports the resolution count of `record`.
    ///
    /// The cache-resident counter is ahead of the stored value until the
    /// worker flushes it, so the larger of the two wins. Falls back to the
    /// stored value if the cache cannot be read.
    pub async fn resolution_count(&self, record: &UrlRecord) -> i64 {
        let cached = match self
            .cache
            .get(&keys::resolution_count(&record.short_code))
            .await
        {
            Ok(value) => value.and_then(|v| v.parse::<i64>().ok()),
            Err(e) => {
                warn!("Cache error reading resolution count: {}", e);
                None
            }
        };

        cached.map_or(record.resolution_count, |c| c.max(record.resolution_count))
    }

    /// Returns true if the resolution worker has stopped receiving events.
    pub fn queue_is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Free slots in the resolution event queue.
    pub fn queue_capacity(&self) -> usize {
        self.events.capacity()
    }

    async fn load(&self, short_code: &str) -> Result<UrlRecord, AppError> {
        self.repository
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short URL not found", json!({ "code": short_code }))
            })
    }

    /// Increments the cache counter and publishes the new total.
    ///
    /// A counter that starts at 1 was missing (never created, evicted or
    /// lost with the cache), so the caller that created it adds the stored
    /// total on top. Concurrent increments land either side of the seed and
    /// none are lost.
    async fn count(&self, short_code: &str, stored_count: Option<i64>) {
        let counter_key = keys::resolution_count(short_code);

        let total = match self.cache.incr(&counter_key).await {
            Ok(1) => self.seed(short_code, &counter_key, stored_count).await,
            Ok(total) => total,
            Err(e) => {
                warn!(short_code, "Failed to increment resolution counter: {}", e);
                return;
            }
        };

        if self
            .events
            .try_send(ResolutionEvent::new(short_code, total))
            .is_err()
        {
            metrics::counter!("resolution_events_dropped_total").increment(1);
            debug!(short_code, "Resolution queue full, event dropped");
        }
    }

    async fn seed(&self, short_code: &str, counter_key: &str, stored_count: Option<i64>) -> i64 {
        let stored = match stored_count {
            Some(count) => count,
            None => match self.repository.find_by_code(short_code).await {
                Ok(record) => record.map_or(0, |r| r.resolution_count),
                Err(e) => {
                    warn!(short_code, "Failed to read stored count for seeding: {}", e);
                    0
                }
            },
        };

        if stored <= 0 {
            return 1;
        }

        match self.cache.incr_by(counter_key, stored).await {
            Ok(total) => {
                debug!(short_code, stored, "Resolution counter seeded from store");
                total
            }
            Err(e) => {
                warn!(short_code, "Failed to seed resolution counter: {}", e);
                1
            }
        }
    }
}
