//! Utility functions shared by the services.
//!
//! - [`base62`] - Integer to base-62 encoding
//! - [`code_generator`] - Short code generation
//! - [`url_validator`] - Origin URL validation
//! - [`email`] - Email address validation and normalization
//! - [`password`] - Argon2id hashing
//! - [`verification_code`] - Six-digit registration codes

pub mod base62;
pub mod code_generator;
pub mod email;
pub mod password;
pub mod url_validator;
pub mod verification_code;
