//! Shortened URL entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A short code mapped to an origin URL, owned by one user.
///
/// `short_code` is globally unique and `(owner, origin_url)` is unique.
/// `resolution_count` lags the cache-resident counter until the resolution
/// worker flushes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub short_code: String,
    pub origin_url: String,
    pub owner: Uuid,
    pub resolution_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a URL record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub short_code: String,
    pub origin_url: String,
    pub owner: Uuid,
}
