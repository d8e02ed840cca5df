//! Handlers for registration, sign-in and account lifecycle.

use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::info;

use crate::api::dto::account::{
    AuthCheckResponse, CredentialsRequest, SignupCompleteRequest, TokenResponse,
};
use crate::domain::entities::User;
use crate::error::AppError;
use crate::state::AppState;

/// Stages a local registration and mails a six-digit code.
///
/// # Endpoint
///
/// `POST /api/user/signup`
///
/// ```json
/// { "email": "alice@example.com", "password": "secret1" }
/// ```
///
/// The code is never part of the response. It expires after 10 minutes.
///
/// # Errors
///
/// Returns 400 Bad Request for an invalid email or a password outside 6-20
/// characters, 409 Conflict if the email is already registered.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<&'static str, AppError> {
    state
        .registration_service
        .begin(&payload.email, &payload.password)
        .await?;

    if state.registration_service.is_bypass() {
        Ok("Registration request accepted (without email verification)")
    } else {
        Ok("Registration request accepted")
    }
}

/// Completes a staged registration with the mailed code.
///
/// # Endpoint
///
/// `POST /api/user/signup/complete`
///
/// ```json
/// { "email": "alice@example.com", "code": "042917" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the stage expired or never existed, or the
/// code does not match; 409 Conflict if the email got registered meanwhile.
pub async fn signup_complete_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignupCompleteRequest>,
) -> Result<&'static str, AppError> {
    state
        .registration_service
        .complete(&payload.email, &payload.code)
        .await?;

    Ok("Registered successfully")
}

/// Exchanges local credentials for a session token.
///
/// # Endpoint
///
/// `POST /api/user/sign`
///
/// # Errors
///
/// Returns 401 Unauthorized for unknown email, wrong password or a
/// federated account, without saying which.
pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .auth_service
        .sign_in(&payload.email, &payload.password)
        .await?;

    Ok(Json(TokenResponse { token }))
}

/// `GET /api/user/auth-check`
pub async fn auth_check_handler(Extension(user): Extension<User>) -> Json<AuthCheckResponse> {
    Json(AuthCheckResponse {
        email: user.email,
        account_type: user.account_type,
    })
}

/// Deletes the authenticated account and everything it owns.
///
/// # Endpoint
///
/// `DELETE /api/user`
///
/// URLs are removed and their cache entries invalidated before the user row
/// goes, so none of the account's codes resolve afterwards. Outstanding
/// tokens stop working because authentication looks the user up.
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    let deleted_urls = state.url_service.delete_all(user.user_id).await?;
    state.users.delete_user(user.user_id).await?;

    info!(email = %user.email, deleted_urls, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
