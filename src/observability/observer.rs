//! Match outcome signals.

use std::fmt;

use crate::observability::metrics;

/// Receives one event per dispatched request.
///
/// Implementations must return quickly and must not panic.
pub trait DispatchObserver: Send + Sync + fmt::Debug {
    /// The request matched `endpoint` (its display name).
    fn match_success(&self, endpoint: &str);

    /// The request matched no endpoint.
    fn match_failure(&self);
}

/// Default observer: a debug log line and a counter per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn match_success(&self, endpoint: &str) {
        tracing::debug!(endpoint = %endpoint, "Request matched endpoint");
        metrics::record_match(true);
    }

    fn match_failure(&self) {
        tracing::debug!("Request did not match any endpoint");
        metrics::record_match(false);
    }
}
