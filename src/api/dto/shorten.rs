//! DTOs for the shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten one URL.
///
/// Only emptiness is checked here; scheme and host rules are applied by the
/// URL service so that each failure gets its own reason.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub shorten_code: String,
    pub short_url: String,
}

/// Resolution count of an owned short code.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub shorten_code: String,
    pub resolution_count: i64,
}
