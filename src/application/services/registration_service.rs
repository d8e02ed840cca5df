//! Two-step local account registration.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::NewUser;
use crate::domain::repositories::{UserRepository, constraints};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheBatch, CacheService, keys};
use crate::infrastructure::mail::EmailMessage;
use crate::utils::email::normalize_email;
use crate::utils::password::hash_password;
use crate::utils::verification_code::{generate_verification_code, is_valid_verification_code};

/// Lifetime shared by both keys of a registration stage.
pub const STAGE_TTL: Duration = Duration::from_secs(10 * 60);

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 20;

/// How a submitted verification code is checked.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Codes are mailed and must match on completion.
    Email(mpsc::UnboundedSender<EmailMessage>),
    /// No mail transport is configured. Codes are neither sent nor compared.
    Bypass,
}

impl Verification {
    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }
}

/// Stages and completes local signups.
///
/// `begin` writes the password hash and the verification code as one
/// transactional batch under `<email>:password` and `<email>:code`, both with
/// [`STAGE_TTL`]. `complete` consumes the pair, creates the user and deletes
/// both keys in another batch. The unique email constraint of the store is
/// the final arbiter between concurrent completions.
pub struct RegistrationService<U: UserRepository + ?Sized> {
    users: Arc<U>,
    cache: Arc<dyn CacheService>,
    verification: Verification,
}

impl<U: UserRepository + ?Sized> RegistrationService<U> {
    pub fn new(users: Arc<U>, cache: Arc<dyn CacheService>, verification: Verification) -> Self {
        if verification.is_bypass() {
            warn!("Email verification is disabled, registrations complete with any code");
        }

        Self {
            users,
            cache,
            verification,
        }
    }

    pub fn is_bypass(&self) -> bool {
        self.verification.is_bypass()
    }

    /// Stages a registration and queues the verification email.
    ///
    /// Returns the generated code. It is sent out of band and must never be
    /// echoed to the client.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] with reason `invalid_email` or `invalid_password`
    /// - [`AppError::Conflict`] with reason `already_registered`
    /// - [`AppError::Unavailable`] if the stage cannot be written
    pub async fn begin(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email)?;

        let password_chars = password.chars().count();
        if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&password_chars) {
            return Err(AppError::bad_request(
                "Password must be 6-20 characters",
                json!({ "reason": "invalid_password" }),
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(already_registered());
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                AppError::internal("Password hashing task failed", json!({ "reason": e.to_string() }))
            })??;

        let code = generate_verification_code();

        let stage = CacheBatch::new()
            .set(keys::staged_password(&email), password_hash, STAGE_TTL)
            .set(keys::staged_code(&email), code.clone(), STAGE_TTL);
        self.cache.exec(stage).await?;

        match &self.verification {
            Verification::Email(mailer) => {
                if mailer
                    .send(EmailMessage::verification(&email, &code))
                    .is_err()
                {
                    warn!("Mail dispatcher is gone, verification email not queued");
                }
                info!(%email, "Registration staged");
            }
            Verification::Bypass => {
                warn!(%email, "Registration staged without email verification");
            }
        }

        Ok(code)
    }

    /// Completes a staged registration and returns the new user's id.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] with reason `invalid_email`, `invalid_code`,
    ///   `stage_not_found` (expired or never staged) or `code_mismatch`
    /// - [`AppError::Conflict`] with reason `already_registered` if the email
    ///   was registered concurrently or by an earlier completion
    pub async fn complete(&self, email: &str, submitted_code: &str) -> Result<Uuid, AppError> {
        let email = normalize_email(email)?;

        if !is_valid_verification_code(submitted_code) {
            return Err(AppError::bad_request(
                "Verification code must be 6 digits",
                json!({ "reason": "invalid_code" }),
            ));
        }

        let staged_code = self.cache.get(&keys::staged_code(&email)).await?;
        let staged_hash = self.cache.get(&keys::staged_password(&email)).await?;

        let (Some(staged_code), Some(staged_hash)) = (staged_code, staged_hash) else {
            return Err(AppError::bad_request(
                "No pending registration for this email",
                json!({ "reason": "stage_not_found" }),
            ));
        };

        if !self.is_bypass() && submitted_code != staged_code {
            return Err(AppError::bad_request(
                "Verification code mismatch",
                json!({ "reason": "code_mismatch" }),
            ));
        }

        let created = self
            .users
            .create_user(NewUser::local(email.clone(), staged_hash))
            .await;

        // A conflict means the email was registered first elsewhere; the stage is spent.
        // Any other failure keeps it so the same code can be retried.
        match created {
            Ok(user) => {
                self.consume_stage(&email).await;
                info!(%email, user_id = %user.user_id, "Registration completed");
                Ok(user.user_id)
            }
            Err(e) if e.is_conflict_on(constraints::USERS_EMAIL) => {
                self.consume_stage(&email).await;
                Err(already_registered())
            }
            Err(e) => {
                warn!(%email, "Registration failed, stage kept for retry: {}", e);
                Err(e)
            }
        }
    }

    async fn consume_stage(&self, email: &str) {
        let batch = CacheBatch::new()
            .delete(keys::staged_password(email))
            .delete(keys::staged_code(email));

        if let Err(e) = self.cache.exec(batch).await {
            warn!(%email, "Failed to delete registration stage: {}", e);
        }
    }
}

fn already_registered() -> AppError {
    AppError::conflict(
        "Email is already registered",
        json!({ "reason": "already_registered" }),
    )
}
