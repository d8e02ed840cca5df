//! Domain layer: entities, repository contracts and the counter pipeline.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`resolution_event`] - Counter totals published by the read path
//! - [`resolution_worker`] - Background flush of counters to the store
//!
//! # Resolution Counter Flow
//!
//! 1. A cache miss is resolved from the store and the counter is `INCR`ed
//! 2. The new total is sent as a [`resolution_event::ResolutionEvent`] (non-blocking)
//! 3. [`resolution_worker::run_resolution_worker`] coalesces and persists it
//!    via [`repositories::UrlRepository::record_resolution_count`]

pub mod entities;
pub mod repositories;
pub mod resolution_event;
pub mod resolution_worker;
