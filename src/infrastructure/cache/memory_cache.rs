//! In-process cache used when Redis is not configured.

use super::service::{BatchOp, CacheBatch, CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// A single-node cache backed by a `HashMap` behind one lock.
///
/// Every operation, including a whole [`CacheBatch`], runs under the same
/// lock, which gives the same all-or-nothing visibility as a Redis
/// transaction. Expired entries are dropped lazily.
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Tests that need real TTL and counter semantics
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        debug!("Using MemoryCache (in-process)");
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> CacheResult<i64> {
        self.incr_by(key, 1).await
    }

    async fn incr_by(&self, key: &str, delta: i64) -> CacheResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        let current = match entries.get(key) {
            Some(entry) if entry.is_live(now) => entry.value.parse::<i64>().map_err(|_| {
                CacheError::OperationError(format!("value at {} is not an integer", key))
            })?,
            _ => 0,
        };

        let expires_at = entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at);
        let next = current + delta;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );

        Ok(next)
    }

    async fn exec(&self, batch: CacheBatch) -> CacheResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        for op in batch.into_ops() {
            match op {
                BatchOp::Set { key, value, ttl } => {
                    entries.insert(
                        key,
                        Entry {
                            value,
                            expires_at: Some(now + ttl),
                        },
                    );
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
