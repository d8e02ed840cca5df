//! Infrastructure layer for external integrations.
//!
//! Concrete implementations of the interfaces the domain and application
//! layers depend on.
//!
//! # Modules
//!
//! - [`cache`] - Fast cache (Redis and in-memory) and its liveness monitor
//! - [`mail`] - SMTP delivery and the background mail dispatcher
//! - [`persistence`] - Durable store (PostgreSQL and in-memory)

pub mod cache;
pub mod mail;
pub mod persistence;
