//! Background worker that persists resolution counters.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::repositories::UrlRepository;
use crate::domain::resolution_event::ResolutionEvent;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheBatch, CacheService, keys};

/// Upper bound on distinct codes coalesced into one flush round.
const MAX_BATCH: usize = 512;

/// Drains resolution events and raises the stored counters.
///
/// Events already queued when the worker wakes up are coalesced per short
/// code, keeping only the highest observed total, so a burst of redirects
/// for one code costs a single store write. Transient store failures are
/// retried with exponential backoff; anything else is logged and dropped.
/// A total for a code whose record is gone removes that code's cache keys,
/// which a resolution racing the delete may have recreated.
/// The loop ends when every sender has been dropped.
pub async fn run_resolution_worker(
    mut rx: mpsc::Receiver<ResolutionEvent>,
    repository: Arc<dyn UrlRepository>,
    cache: Arc<dyn CacheService>,
) {
    info!("Resolution worker started");

    let mut pending: HashMap<String, i64> = HashMap::new();

    while let Some(event) = rx.recv().await {
        coalesce(&mut pending, event);

        while pending.len() < MAX_BATCH {
            match rx.try_recv() {
                Ok(event) => coalesce(&mut pending, event),
                Err(_) => break,
            }
        }

        for (short_code, observed) in pending.drain() {
            flush(repository.as_ref(), cache.as_ref(), &short_code, observed).await;
        }
    }

    info!("Resolution worker stopped");
}

fn coalesce(pending: &mut HashMap<String, i64>, event: ResolutionEvent) {
    let entry = pending.entry(event.short_code).or_insert(0);
    *entry = (*entry).max(event.observed_count);
}

async fn flush(
    repository: &dyn UrlRepository,
    cache: &dyn CacheService,
    short_code: &str,
    observed: i64,
) {
    let strategy = ExponentialBackoff::from_millis(10).map(jitter).take(3);

    let result = RetryIf::spawn(
        strategy,
        move || repository.record_resolution_count(short_code, observed),
        |e: &AppError| matches!(e, AppError::Unavailable { .. }),
    )
    .await;

    match result {
        Ok(true) => debug!(short_code, observed, "Resolution count flushed"),
        Ok(false) => {
            debug!(short_code, "Resolution count dropped, record is gone");
            let batch = CacheBatch::new()
                .delete(keys::resolved_url(short_code))
                .delete(keys::resolution_count(short_code));
            if let Err(e) = cache.exec(batch).await {
                warn!(short_code, error = %e, "Failed to clear cache keys of deleted record");
            }
        }
        Err(e) => {
            metrics::counter!("resolution_flush_failed_total").increment(1);
            warn!(short_code, observed, error = %e, "Failed to flush resolution count");
        }
    }
}
