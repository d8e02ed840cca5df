//! API route configuration.

use crate::api::handlers::{
    auth_check_handler, count_handler, delete_account_handler, delete_url_handler,
    list_urls_handler, shorten_handler, sign_in_handler, signup_complete_handler, signup_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Routes that require a session token.
///
/// The caller is resolved by [`crate::api::middleware::auth`] and handed to
/// handlers as `Extension<User>`.
///
/// # Endpoints
///
/// - `POST   /shortener`              - Shorten a URL
/// - `GET    /shortener/{code}/count` - Resolution count of an owned code
/// - `GET    /user/urls`              - List own URLs (paginated)
/// - `DELETE /user/urls/{code}`       - Delete an own URL
/// - `GET    /user/auth-check`        - Identity behind the token
/// - `DELETE /user`                   - Delete the account and its URLs
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/shortener", post(shorten_handler))
        .route("/shortener/{code}/count", get(count_handler))
        .route("/user/urls", get(list_urls_handler))
        .route("/user/urls/{code}", delete(delete_url_handler))
        .route("/user/auth-check", get(auth_check_handler))
        .route("/user", delete(delete_account_handler))
}

/// Unauthenticated account routes.
///
/// # Endpoints
///
/// - `POST /user/signup`          - Stage a registration
/// - `POST /user/signup/complete` - Complete it with the mailed code
/// - `POST /user/sign`            - Password sign-in
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup_handler))
        .route("/user/signup/complete", post(signup_complete_handler))
        .route("/user/sign", post(sign_in_handler))
}
