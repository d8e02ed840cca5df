//! Session token issuance and validation.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::entities::{AccountType, NewUser, User};
use crate::domain::repositories::{UserRepository, constraints};
use crate::error::AppError;
use crate::utils::email::normalize_email;
use crate::utils::password::verify_password;

/// Tokens older than this are rejected.
pub const TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Unix seconds at issuance.
    pub issued: i64,
}

/// Stateless HS256 session tokens.
///
/// Expiry is computed from the `issued` claim rather than `exp`. The token
/// alone is never trusted: every [`authenticate`](Self::authenticate) call
/// looks the user up, so deleting an account revokes its outstanding tokens.
pub struct AuthService<U: UserRepository + ?Sized> {
    users: Arc<U>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl<U: UserRepository + ?Sized> AuthService<U> {
    pub fn new(users: Arc<U>, signing_key: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            users,
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
        }
    }

    /// Signs a token for `user`.
    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let claims = Claims {
            email: user.email.clone(),
            account_type: user.account_type,
            issued: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::internal("Failed to sign token", json!({ "reason": e.to_string() }))
        })
    }

    /// Validates `token` and returns the user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed, carries
    /// a bad signature, is older than [`TOKEN_LIFETIME_SECS`], or names a user
    /// that no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                invalid_token()
            })?
            .claims;

        let age = Utc::now().timestamp() - claims.issued;
        if age > TOKEN_LIFETIME_SECS {
            return Err(AppError::unauthorized(
                "Token expired",
                json!({ "reason": "token_expired" }),
            ));
        }

        self.users
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(invalid_token)
    }

    /// Password sign-in for local accounts.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] with reason `invalid_email`
    /// - [`AppError::Unauthorized`] for an unknown email, a federated account
    ///   or a wrong password, without saying which
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(bad_credentials)?;

        let Some(stored_hash) = user
            .password_hash
            .clone()
            .filter(|_| user.account_type == AccountType::Local)
        else {
            return Err(bad_credentials());
        };

        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| {
                AppError::internal("Password check task failed", json!({ "reason": e.to_string() }))
            })??;

        if !matches {
            return Err(bad_credentials());
        }

        info!(%email, "User signed in");
        self.issue_token(&user)
    }

    /// Signs in an identity asserted by an external OAuth provider,
    /// creating the federated account on first use.
    pub async fn sign_in_federated(&self, email: &str) -> Result<String, AppError> {
        let email = normalize_email(email)?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => match self.users.create_user(NewUser::federated(email.clone())).await {
                Ok(user) => {
                    info!(%email, "Federated account created");
                    user
                }
                // Lost a race with a concurrent first sign-in.
                Err(e) if e.is_conflict_on(constraints::USERS_EMAIL) => self
                    .users
                    .find_by_email(&email)
                    .await?
                    .ok_or_else(|| AppError::internal("User vanished after conflict", json!({})))?,
                Err(e) => return Err(e),
            },
        };

        self.issue_token(&user)
    }
}

fn invalid_token() -> AppError {
    AppError::unauthorized("Invalid token", json!({ "reason": "invalid_token" }))
}

fn bad_credentials() -> AppError {
    AppError::unauthorized(
        "Invalid email or password",
        json!({ "reason": "invalid_credentials" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockUserRepository;
    use crate::utils::password::hash_password;
    use uuid::Uuid;

    const KEY: &str = "test-jwt-key";

    fn user(email: &str, account_type: AccountType, password_hash: Option<String>) -> User {
        User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            account_type,
            password_hash,
            updated_at: Utc::now(),
        }
    }

    fn token_with(claims: &Claims, key: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_issue_then_authenticate() {
        let alice = user("alice@example.com", AccountType::Federated, None);
        let found = alice.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "alice@example.com")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let svc = AuthService::new(Arc::new(users), KEY);
        let token = svc.issue_token(&alice).unwrap();

        assert_eq!(svc.authenticate(&token).await.unwrap(), alice);
    }

    #[tokio::test]
    async fn test_claims_use_type_field() {
        let svc = AuthService::new(Arc::new(MockUserRepository::new()), KEY);
        let token = svc
            .issue_token(&user("a@b.com", AccountType::Local, None))
            .unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(KEY.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(raw["type"], "local");
        assert_eq!(raw["email"], "a@b.com");
        assert!(raw["issued"].is_i64());
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let svc = AuthService::new(Arc::new(users), KEY);
        let token = svc
            .issue_token(&user("gone@example.com", AccountType::Local, None))
            .unwrap();

        let err = svc.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_without_lookup() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().never();

        let svc = AuthService::new(Arc::new(users), KEY);
        let claims = Claims {
            email: "a@b.com".to_string(),
            account_type: AccountType::Local,
            issued: Utc::now().timestamp() - TOKEN_LIFETIME_SECS - 60,
        };

        let err = svc.authenticate(&token_with(&claims, KEY)).await.unwrap_err();
        assert_eq!(err.reason(), Some("token_expired"));
    }

    #[tokio::test]
    async fn test_foreign_signature_and_garbage_are_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().never();

        let svc = AuthService::new(Arc::new(users), KEY);
        let claims = Claims {
            email: "a@b.com".to_string(),
            account_type: AccountType::Local,
            issued: Utc::now().timestamp(),
        };

        for token in [token_with(&claims, "other-key"), "not.a.jwt".to_string()] {
            let err = svc.authenticate(&token).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized { .. }));
        }
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let hash = hash_password("secret1").unwrap();
        let stored = user("a@b.com", AccountType::Local, Some(hash));

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));

        let svc = AuthService::new(Arc::new(users), KEY);

        assert!(svc.sign_in("A@b.com", "secret1").await.is_ok());

        let err = svc.sign_in("a@b.com", "secret2").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_federated_and_unknown() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            if email == "fed@b.com" {
                Ok(Some(user(email, AccountType::Federated, None)))
            } else {
                Ok(None)
            }
        });

        let svc = AuthService::new(Arc::new(users), KEY);

        for email in ["fed@b.com", "nobody@b.com"] {
            let err = svc.sign_in(email, "secret1").await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized { .. }));
            assert_eq!(err.reason(), Some("invalid_credentials"));
        }

        let err = svc.sign_in("not-an-email", "secret1").await.unwrap_err();
        assert_eq!(err.reason(), Some("invalid_email"));
    }

    #[tokio::test]
    async fn test_federated_sign_in_creates_once() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().times(1).returning(|_| Ok(None));
        users
            .expect_create_user()
            .withf(|new| new.account_type == AccountType::Federated && new.password_hash.is_none())
            .times(1)
            .returning(|new| {
                Ok(User {
                    user_id: new.user_id,
                    email: new.email,
                    account_type: new.account_type,
                    password_hash: None,
                    updated_at: Utc::now(),
                })
            });

        let svc = AuthService::new(Arc::new(users), KEY);
        assert!(svc.sign_in_federated("New@b.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_federated_sign_in_recovers_from_race() {
        let mut seq = mockall::Sequence::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        users
            .expect_create_user()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": "users_email_key" }),
                ))
            });
        users
            .expect_find_by_email()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|email| Ok(Some(user(email, AccountType::Federated, None))));

        let svc = AuthService::new(Arc::new(users), KEY);
        assert!(svc.sign_in_federated("a@b.com").await.is_ok());
    }
}
