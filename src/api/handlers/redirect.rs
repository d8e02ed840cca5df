//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its origin URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Resolution goes through [`ResolutionService`](crate::application::services::ResolutionService):
/// cache first, store on a miss, and the resolution counter is incremented
/// for every successful redirect.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let origin_url = state.resolution_service.resolve(&code).await?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, origin_url)]))
}
