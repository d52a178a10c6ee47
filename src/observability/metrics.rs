//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_matches_total` (counter): match outcomes by `outcome`
//! - `dispatch_matcher_builds_total` (counter): matcher builds by `result`
//! - `dispatch_matcher_build_seconds` (histogram): matcher build time
//! - `dispatch_requests_total` (counter): responses by `status`

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_match(matched: bool) {
    let outcome = if matched { "matched" } else { "unmatched" };
    counter!("dispatch_matches_total", "outcome" => outcome).increment(1);
}

pub fn record_matcher_build(success: bool, elapsed: Duration) {
    let result = if success { "success" } else { "failure" };
    counter!("dispatch_matcher_builds_total", "result" => result).increment(1);
    histogram!("dispatch_matcher_build_seconds").record(elapsed.as_secs_f64());
}

pub fn record_request(status: u16) {
    counter!("dispatch_requests_total", "status" => status.to_string()).increment(1);
}
