//! Cache service trait, transactional batch and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend unreachable. Callers may treat this as transient.
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A single write queued in a [`CacheBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    Delete {
        key: String,
    },
}

/// A group of writes applied all-or-nothing by [`CacheService::exec`].
///
/// No reader may observe a state where only part of the batch is visible.
///
/// ```ignore
/// let batch = CacheBatch::new()
///     .set("a@b.com:password", &hash, STAGE_TTL)
///     .set("a@b.com:code", &code, STAGE_TTL);
/// cache.exec(batch).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheBatch {
    ops: Vec<BatchOp>,
}

impl CacheBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `SET key value EX ttl`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) -> Self {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value: value.into(),
            ttl,
        });
        self
    }

    /// Queues a `DEL key`.
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(BatchOp::Delete { key: key.into() });
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Key-value cache with TTLs, atomic counters and transactional batches.
///
/// Used both as a cache-aside accelerator for resolutions and as the
/// staging area for unverified registrations. It is never the source of
/// truth for whether a URL record exists.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, `MULTI/EXEC` batches
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process fallback
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically increments the integer stored at `key` and returns the new value.
    ///
    /// A missing key counts from zero. Concurrent callers never lose increments.
    async fn incr(&self, key: &str) -> CacheResult<i64>;

    /// Atomically adds `delta` to the integer stored at `key` and returns the new value.
    ///
    /// Same missing-key and concurrency rules as [`CacheService::incr`].
    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64>;

    /// Applies every operation of `batch` atomically.
    async fn exec(&self, batch: CacheBatch) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}
