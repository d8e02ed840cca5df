//! User account entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Email + password, created by completing a registration stage.
    Local,
    /// Identity asserted by an external OAuth provider; no password.
    Federated,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Federated => "federated",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "federated" => Ok(Self::Federated),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// A registered account.
///
/// `email` is stored lowercased and is unique. `password_hash` is present
/// iff the account is [`AccountType::Local`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub account_type: AccountType,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: Uuid,
    pub email: String,
    pub account_type: AccountType,
    pub password_hash: Option<String>,
}

impl NewUser {
    /// A local account with a fresh random id.
    pub fn local(email: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            account_type: AccountType::Local,
            password_hash: Some(password_hash),
        }
    }

    /// A federated account with a fresh random id and no password.
    pub fn federated(email: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            account_type: AccountType::Federated,
            password_hash: None,
        }
    }
}
