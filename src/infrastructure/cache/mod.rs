//! Fast key-value cache sitting in front of the durable store.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - In-process cache used when Redis is not configured
//!
//! Key naming lives in [`keys`]; [`monitor`] runs the periodic liveness ping.

pub mod keys;
mod memory_cache;
pub mod monitor;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use service::{BatchOp, CacheBatch, CacheError, CacheResult, CacheService};

#[cfg(test)]
pub use service::MockCacheService;
