//! Offset/limit query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// `?offset=&limit=` for list endpoints.
///
/// Uses `serde_with` to parse the numbers from query strings; a value that is
/// not an unsigned integer rejects the request.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub offset: Option<u64>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Converts to database `(offset, limit)`.
    ///
    /// # Defaults
    ///
    /// - `offset`: 0
    /// - `limit`: [`DEFAULT_LIMIT`]; a limit below 1 also falls back to it,
    ///   and limits above [`MAX_LIMIT`] are capped
    pub fn offset_limit(&self) -> (i64, i64) {
        let offset = self
            .offset
            .map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

        let limit = match self.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(l) => i64::try_from(l).unwrap_or(MAX_LIMIT).min(MAX_LIMIT),
        };

        (offset, limit)
    }
}
