//! Prometheus Metrics Module
//!
//! Application-wide metrics collection.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - Active gateway connection gauge
//! - Broadcast event counts by event type

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace("trackroom"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// Active gateway connections gauge
pub static GATEWAY_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "gateway_connections_active",
            "Number of active gateway connections",
        )
        .namespace("trackroom"),
    )
    .expect("Failed to create GATEWAY_CONNECTIONS_ACTIVE metric")
});

/// Broadcast event counter by event type
pub static GATEWAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gateway_events_total",
            "Total number of room events broadcast",
        )
        .namespace("trackroom"),
        &["event"],
    )
    .expect("Failed to create GATEWAY_EVENTS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(GATEWAY_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register GATEWAY_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(GATEWAY_EVENTS_TOTAL.clone()))
        .expect("Failed to register GATEWAY_EVENTS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
}

/// Helper to update the gateway connection count
pub fn set_gateway_connections(connected: i64) {
    GATEWAY_CONNECTIONS_ACTIVE.set(connected);
}

/// Helper to count a broadcast event
pub fn record_gateway_event(event: &str) {
    GATEWAY_EVENTS_TOTAL.with_label_values(&[event]).inc();
}
