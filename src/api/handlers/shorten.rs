//! Handlers for creating short URLs and reading their counters.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::dto::shorten::{CountResponse, ShortenRequest, ShortenResponse};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens a URL for the authenticated user.
///
/// # Endpoint
///
/// `POST /api/shortener`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// # Response
///
/// ```json
/// { "shorten_code": "3bX9kQ1aZ", "short_url": "http://url-shortener.com:8080/3bX9kQ1aZ" }
/// ```
///
/// Shortening a URL the user already shortened returns the existing code.
///
/// # Errors
///
/// Returns 400 Bad Request for an empty, malformed, non-HTTP(S) or
/// self-referencing URL, and 409 Conflict if no free code was found.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let code = state.url_service.shorten(user.user_id, &payload.url).await?;
    let short_url = state.url_service.short_url(&code);

    Ok(Json(ShortenResponse {
        shorten_code: code,
        short_url,
    }))
}

/// Returns how many times one of the user's short codes was resolved.
///
/// # Endpoint
///
/// `GET /api/shortener/{code}/count`
///
/// # Errors
///
/// Returns 404 Not Found if the code does not exist or belongs to another user.
pub async fn count_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(code): Path<String>,
) -> Result<Json<CountResponse>, AppError> {
    let record = state.url_service.get_owned(user.user_id, &code).await?;
    let resolution_count = state.resolution_service.resolution_count(&record).await;

    Ok(Json(CountResponse {
        shorten_code: record.short_code,
        resolution_count,
    }))
}
