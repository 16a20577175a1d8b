//! Special endpoint handlers for the proxy.
//!
//! - `/health` - Health check endpoint
//! - `/metrics` - Prometheus metrics export
//!
//! Functions return `EndpointResponse` instead of writing directly to the
//! session; the caller writes it.

use std::time::Instant;

use crate::metrics::Metrics;

pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";

/// Response from a special endpoint handler.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl EndpointResponse {
    /// Create a JSON response with the given status and body.
    pub fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    /// Create a plain text response (for Prometheus metrics).
    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; version=0.0.4",
            body,
        }
    }
}

/// Generate response for /health endpoint.
pub fn handle_health(start_time: Instant) -> EndpointResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION")
    })
    .to_string();

    EndpointResponse::json(200, body)
}

/// Generate response for /metrics endpoint.
pub fn handle_metrics(metrics: &Metrics) -> EndpointResponse {
    EndpointResponse::prometheus(metrics.export_prometheus())
}

/// Dispatch a path to its special endpoint, if it is one
pub fn handle_special_endpoint(
    path: &str,
    start_time: Instant,
    metrics: &Metrics,
) -> Option<EndpointResponse> {
    match path {
        HEALTH_PATH => Some(handle_health(start_time)),
        METRICS_PATH => Some(handle_metrics(metrics)),
        _ => None,
    }
}
