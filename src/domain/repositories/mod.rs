//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the durable store. Implementations live in
//! `crate::infrastructure::persistence` (PostgreSQL and in-memory); mocks are
//! generated with `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - Account storage and lookup
//! - [`UrlRepository`] - Short URL storage, lookup and counter flushes
//!
//! # Conflicts
//!
//! Creates report uniqueness violations as [`crate::error::AppError::Conflict`]
//! whose `details.constraint` names the violated constraint (see [`constraints`]).

pub mod url_repository;
pub mod user_repository;

pub use url_repository::UrlRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use url_repository::MockUrlRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;

/// Names of the store's uniqueness constraints.
pub mod constraints {
    /// Primary key on `urls.short_code`.
    pub const URLS_PKEY: &str = "urls_pkey";
    /// Unique `(owner, origin_url)`.
    pub const URLS_OWNER_ORIGIN: &str = "urls_owner_origin_url_key";
    /// Unique `users.email`.
    pub const USERS_EMAIL: &str = "users_email_key";
}
