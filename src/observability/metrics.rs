//! Gateway request metrics.
//!
//! # Metrics
//! - `storefront_gateway_requests_total` (counter): requests by route
//!   and status
//! - `storefront_gateway_request_duration_seconds` (histogram):
//!   gateway-observed latency by route

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with a scrape listener. Failure to
/// bind is logged, not fatal; the facade macros become no-ops.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(err) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %err, "Failed to install Prometheus exporter");
        return;
    }

    describe_counter!(
        "storefront_gateway_requests_total",
        "Total requests handled by the gateway, by route and status"
    );
    describe_histogram!(
        "storefront_gateway_request_duration_seconds",
        Unit::Seconds,
        "Gateway-observed request latency, by route"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
}

/// Record one gateway request outcome.
pub fn record_gateway_request(route: &'static str, status: u16, started: Instant) {
    counter!(
        "storefront_gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "storefront_gateway_request_duration_seconds",
        "route" => route
    )
    .record(started.elapsed().as_secs_f64());
}
