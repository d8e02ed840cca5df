//! Argon2id password hashing.

use argon2::Argon2;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use serde_json::json;

use crate::error::AppError;

const SALT_LEN: usize = 16;

/// Hashes `password` with Argon2id and a fresh random salt.
///
/// Returns a PHC string (`$argon2id$v=19$...`) that embeds the salt and
/// parameters, so verification needs nothing else.
///
/// CPU-bound: callers on the async runtime run it via `spawn_blocking`.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the entropy source or the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    getrandom::fill(&mut salt_bytes).map_err(|e| {
        AppError::internal(
            "Entropy source unavailable",
            json!({ "reason": "entropy_unavailable", "source": e.to_string() }),
        )
    })?;

    let salt = SaltString::encode_b64(&salt_bytes).map_err(hashing_error)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(hashing_error)
}

/// Checks `password` against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(hashing_error)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(hashing_error(e)),
    }
}

fn hashing_error(e: PasswordHashError) -> AppError {
    AppError::internal("Password hashing failed", json!({ "reason": e.to_string() }))
}
