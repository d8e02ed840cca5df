//! Email address checks shared by registration and sign-in.

use serde_json::json;
use validator::ValidateEmail;

use crate::error::AppError;

/// Validates `raw` and returns it lowercased.
///
/// Accounts and registration stages are keyed by the lowercased address.
///
/// # Errors
///
/// Returns [`AppError::Validation`] with reason `invalid_email`.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    if !raw.validate_email() {
        return Err(AppError::bad_request(
            "Invalid email address",
            json!({ "reason": "invalid_email" }),
        ));
    }

    Ok(raw.to_lowercase())
}
