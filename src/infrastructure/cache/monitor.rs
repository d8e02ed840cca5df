//! Periodic cache liveness check.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use super::CacheService;

/// Pings the cache every `period` and reports state transitions.
///
/// The current state is exported as the `cache_up` gauge (1 or 0). A failed
/// ping never affects request handling; resolutions already fall back to
/// the store when the cache cannot be read.
pub async fn run_cache_monitor(cache: Arc<dyn CacheService>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut was_up = true;

    loop {
        ticker.tick().await;

        let up = cache.health_check().await;
        metrics::gauge!("cache_up").set(if up { 1.0 } else { 0.0 });

        match (was_up, up) {
            (true, false) => warn!("Cache PING failed, resolutions will use the store"),
            (false, true) => info!("Cache connection restored"),
            _ => {}
        }

        was_up = up;
    }
}
