//! Handlers for an account's URL collection.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::dto::pagination::PaginationParams;
use crate::api::dto::urls::{UrlItem, UrlListResponse};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the authenticated user's short URLs, most recently updated first.
///
/// # Endpoint
///
/// `GET /api/user/urls?offset=0&limit=100`
///
/// `limit` defaults to 100, values below 1 fall back to the default and
/// values above 1000 are capped. Counts include resolutions the
/// background worker has not yet flushed.
///
/// # Errors
///
/// Returns 404 Not Found if the page is empty, 400 Bad Request if
/// `offset` or `limit` is not an unsigned integer.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<UrlListResponse>, AppError> {
    let (offset, limit) = params.offset_limit();

    let (total, records) = state.url_service.list(user.user_id, offset, limit).await?;

    let mut urls = Vec::with_capacity(records.len());
    for record in records {
        let resolution_count = state.resolution_service.resolution_count(&record).await;
        urls.push(UrlItem {
            short_url: state.url_service.short_url(&record.short_code),
            origin_url: record.origin_url,
            shorten_code: record.short_code,
            resolution_count,
            updated_at: record.updated_at,
        });
    }

    Ok(Json(UrlListResponse { total, urls }))
}

/// Deletes one of the authenticated user's short URLs.
///
/// # Endpoint
///
/// `DELETE /api/user/urls/{code}`
///
/// The code stops resolving immediately: cached entries are removed before
/// the response is sent.
///
/// # Errors
///
/// Returns 404 Not Found if the code does not exist or belongs to another user.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.url_service.delete(user.user_id, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}
