//! Origin URL validation for the shorten path.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Validates a URL submitted for shortening and returns its canonical form.
///
/// # Rules
///
/// - Must parse as an absolute URL
/// - Scheme must be `http` or `https`
/// - Must carry a host
/// - Host must not equal `own_domain` (case-insensitive), which would make
///   the short link resolve to itself
///
/// The canonical form is what the `url` crate serializes (lowercased host,
/// trailing `/` on an empty path), so the same submitted URL always maps to
/// the same stored `origin_url`.
///
/// # Errors
///
/// Returns [`AppError::Validation`] with reason `invalid_url`,
/// `unsupported_scheme` or `recursive_url`.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_origin_url("https://example.com/a", "sho.rt").is_ok());
/// assert!(validate_origin_url("ftp://example.com", "sho.rt").is_err());
/// assert!(validate_origin_url("https://SHO.RT/x", "sho.rt").is_err());
/// ```
pub fn validate_origin_url(raw: &str, own_domain: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(
            "URL must not be empty",
            json!({ "reason": "invalid_url" }),
        ));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        AppError::bad_request(
            "Invalid URL format",
            json!({ "reason": "invalid_url", "error": e.to_string() }),
        )
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::bad_request(
            "Only http and https URLs can be shortened",
            json!({ "reason": "unsupported_scheme", "scheme": url.scheme() }),
        ));
    }

    let host = url.host_str().ok_or_else(|| {
        AppError::bad_request("URL has no host", json!({ "reason": "invalid_url" }))
    })?;

    if host.eq_ignore_ascii_case(own_domain) {
        return Err(AppError::bad_request(
            "Shortening this service's own URLs is not allowed",
            json!({ "reason": "recursive_url" }),
        ));
    }

    Ok(url.to_string())
}
