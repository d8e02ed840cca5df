//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`User`] - An account, local (password) or federated (external identity)
//! - [`UrlRecord`] - A shortened URL owned by a user
//!
//! Separate `New*` structs carry the data needed to create a record.

pub mod url_record;
pub mod user;

pub use url_record::{NewUrlRecord, UrlRecord};
pub use user::{AccountType, NewUser, User};
