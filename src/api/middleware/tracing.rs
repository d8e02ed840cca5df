//! HTTP request/response tracing middleware.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Request spans at `INFO`, responses with latency in milliseconds, and
/// 5xx responses logged at `ERROR`.
///
/// ```text
/// INFO request{method=GET uri=/3bX9kQ1aZ version=HTTP/1.1}: finished processing request latency=1 ms status=301
/// ```
///
/// Short codes appear in the `uri` field; origin URLs and tokens do not.
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(DefaultOnFailure::new().level(Level::ERROR))
}
