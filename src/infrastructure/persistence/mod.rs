//! Durable store implementations.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Accounts in PostgreSQL
//! - [`PgUrlRepository`] - Short URLs in PostgreSQL
//! - [`MemoryStore`] - Both repositories in process memory

pub mod memory_store;
pub mod pg_url_repository;
pub mod pg_user_repository;

pub use memory_store::MemoryStore;
pub use pg_url_repository::PgUrlRepository;
pub use pg_user_repository::PgUserRepository;
