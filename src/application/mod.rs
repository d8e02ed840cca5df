//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, the cache and validation. They are
//! generic over the repository traits, so the same code runs against
//! PostgreSQL, the in-memory store and `mockall` mocks.
//!
//! # Available Services
//!
//! - [`services::url_service::UrlService`] - Shortening, listing and deletion
//! - [`services::resolution_service::ResolutionService`] - Cache-aside redirects and counters
//! - [`services::registration_service::RegistrationService`] - Staged local signups
//! - [`services::auth_service::AuthService`] - Session tokens and sign-in

pub mod services;
