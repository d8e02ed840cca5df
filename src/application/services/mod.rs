//! Business logic services for the application layer.

pub mod auth_service;
pub mod registration_service;
pub mod resolution_service;
pub mod url_service;

pub use auth_service::{AuthService, Claims};
pub use registration_service::{RegistrationService, Verification};
pub use resolution_service::ResolutionService;
pub use url_service::UrlService;
