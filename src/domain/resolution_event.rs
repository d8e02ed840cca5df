//! Resolution counter event passed from the read path to the worker.

/// The counter total observed right after a successful `INCR`.
///
/// Carries the absolute total rather than a delta, so the worker can apply
/// events in any order and any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub short_code: String,
    pub observed_count: i64,
}

impl ResolutionEvent {
    pub fn new(short_code: impl Into<String>, observed_count: i64) -> Self {
        Self {
            short_code: short_code.into(),
            observed_count,
        }
    }
}
