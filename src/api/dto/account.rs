//! DTOs for signup, sign-in and account endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::AccountType;

/// Email and password, used by both signup and sign-in.
///
/// Field rules are enforced by the services, which attach specific reasons
/// (`invalid_email`, `invalid_password`).
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupCompleteRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Identity behind the presented token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthCheckResponse {
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}
