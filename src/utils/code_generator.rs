//! Short code generation.
//!
//! A code is the base-62 encoding of a uniform random integer below 10^9,
//! followed by the base-62 encoding of the sub-second nanosecond fraction of
//! the current time. Uniqueness is only probabilistic; the store's primary
//! key on `short_code` is the final authority and callers retry on collision.

use serde_json::json;

use crate::error::AppError;
use crate::utils::base62;

/// Exclusive upper bound of the random component.
const RANDOM_BOUND: u32 = 1_000_000_000;

/// Largest multiple of [`RANDOM_BOUND`] that fits in a `u32`.
///
/// Draws at or above this value are rejected so that `draw % RANDOM_BOUND`
/// stays uniform.
const REJECTION_ZONE: u32 = (u32::MAX / RANDOM_BOUND) * RANDOM_BOUND;

/// Source of candidate short codes.
///
/// The shorten path depends on this trait rather than on a free function so
/// that collision handling can be tested with deterministic sequences.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// Produces a fresh candidate code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] with reason `entropy_unavailable` when the
    /// OS entropy source fails. This is fatal for the request and never retried.
    fn generate(&self) -> Result<String, AppError>;
}

/// Production generator backed by the OS entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl RandomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> Result<String, AppError> {
        let random = uniform_below_bound()?;
        let nanos = chrono::Utc::now().timestamp_subsec_nanos();

        let mut code = base62::encode(u64::from(random));
        code.push_str(&base62::encode(u64::from(nanos)));
        Ok(code)
    }
}

/// Draws a uniform integer in `[0, RANDOM_BOUND)` by rejection sampling.
fn uniform_below_bound() -> Result<u32, AppError> {
    loop {
        let mut buffer = [0u8; 4];
        getrandom::fill(&mut buffer).map_err(|e| {
            AppError::internal(
                "Entropy source unavailable",
                json!({ "reason": "entropy_unavailable", "source": e.to_string() }),
            )
        })?;

        let draw = u32::from_le_bytes(buffer);
        if draw < REJECTION_ZONE {
            return Ok(draw % RANDOM_BOUND);
        }
    }
}
