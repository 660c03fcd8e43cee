//! Prometheus metrics.
//!
//! Records request outcomes, cache hit/miss ratios per platform, and
//! upstream failures. The recorder is installed once at startup; before
//! that (and in router-level tests) the macros are no-ops.

use crate::platform::Platform;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Safe to call once per process.
pub fn init() {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(e) => warn!("Failed to install metrics recorder: {}", e),
    }
}

/// Render the current metrics snapshot, empty if no recorder is installed.
pub fn render() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}

pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "vidlink_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_cache(platform: Platform, hit: bool) {
    counter!(
        "vidlink_cache_lookups_total",
        "platform" => platform.key_prefix(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_upstream_error(platform: Platform) {
    counter!(
        "vidlink_upstream_errors_total",
        "platform" => platform.key_prefix()
    )
    .increment(1);
}
