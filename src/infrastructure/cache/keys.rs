//! Cache key namespaces.
//!
//! Resolution entries are keyed by short code, registration stages by the
//! lowercased email. The two namespaces never overlap because short codes
//! are base-62 and cannot contain `:` or `@`.

/// Cached origin URL for a short code.
pub fn resolved_url(code: &str) -> String {
    format!("resolved-url:{}", code)
}

/// Cache-resident resolution counter for a short code.
pub fn resolution_count(code: &str) -> String {
    format!("resolution-count:{}", code)
}

/// Staged password hash of a pending registration.
pub fn staged_password(email: &str) -> String {
    format!("{}:password", email)
}

/// Staged verification code of a pending registration.
pub fn staged_code(email: &str) -> String {
    format!("{}:code", email)
}
