//! DTOs for listing an account's URLs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlListResponse {
    /// Total records owned, independent of the page.
    pub total: i64,
    pub urls: Vec<UrlItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlItem {
    pub origin_url: String,
    pub shorten_code: String,
    pub short_url: String,
    pub resolution_count: i64,
    pub updated_at: DateTime<Utc>,
}
