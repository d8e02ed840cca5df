//! Outbound email for registration verification.
//!
//! Messages are queued on an unbounded channel by the registration service
//! and delivered by [`dispatcher::run_mail_dispatcher`] through an
//! [`EmailProvider`]. Delivery never blocks or fails the request that
//! queued the message.

pub mod dispatcher;
mod smtp;

pub use dispatcher::{DeliveryOutcome, run_mail_dispatcher};
pub use smtp::SmtpProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Email sending error
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A plain-text message waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// The message carrying a registration verification code.
    pub fn verification(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Registration confirmation".to_string(),
            body: format!("Your verification code is {}", code),
        }
    }
}

/// Trait for email providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_contains_code() {
        let message = EmailMessage::verification("a@b.com", "012345");
        assert_eq!(message.to, "a@b.com");
        assert!(message.body.contains("012345"));
    }
}
