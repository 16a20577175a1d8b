// Metrics module - Prometheus-compatible counters for the edge server

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Metrics struct tracks counters for Prometheus export
/// Thread-safe via atomic operations and a mutex for the status map
pub struct Metrics {
    request_count: AtomicU64,

    // Status code counters (e.g., 200, 400, 304)
    status_counts: Mutex<BTreeMap<u16, u64>>,

    // Requests rejected before any fetch
    signature_failures: AtomicU64,
    validation_failures: AtomicU64,

    // Non-OK origin responses replaced by the generic 400
    upstream_failures: AtomicU64,

    active_requests: AtomicU64,

    // Request duration (microseconds)
    duration_sum_micros: AtomicU64,
    duration_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            request_count: AtomicU64::new(0),
            status_counts: Mutex::new(BTreeMap::new()),
            signature_failures: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            duration_sum_micros: AtomicU64::new(0),
            duration_count: AtomicU64::new(0),
        }
    }

    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_status_count(&self, status: u16) {
        if let Ok(mut counts) = self.status_counts.lock() {
            *counts.entry(status).or_insert(0) += 1;
        }
    }

    pub fn get_status_count(&self, status: u16) -> u64 {
        self.status_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&status).copied())
            .unwrap_or(0)
    }

    pub fn increment_signature_failure(&self) {
        self.signature_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_signature_failures(&self) -> u64 {
        self.signature_failures.load(Ordering::Relaxed)
    }

    pub fn increment_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_validation_failures(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    pub fn increment_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }

    pub fn increment_active_requests(&self) {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_requests(&self) {
        // Saturating so a stray decrement can never wrap the gauge
        let _ = self
            .active_requests
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn get_active_requests(&self) -> u64 {
        self.active_requests.load(Ordering::Relaxed)
    }

    pub fn record_duration(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.duration_sum_micros.fetch_add(micros, Ordering::Relaxed);
        self.duration_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Export all metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP http_requests_total Total number of HTTP requests received\n");
        output.push_str("# TYPE http_requests_total counter\n");
        output.push_str(&format!(
            "http_requests_total {}\n",
            self.request_count.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP http_requests_by_status_total HTTP requests by status code\n");
        output.push_str("# TYPE http_requests_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            for (status, count) in counts.iter() {
                output.push_str(&format!(
                    "http_requests_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        output.push_str("\n# HELP signature_failures_total Requests rejected by signature verification\n");
        output.push_str("# TYPE signature_failures_total counter\n");
        output.push_str(&format!(
            "signature_failures_total {}\n",
            self.signature_failures.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP validation_failures_total Requests rejected by path or parameter validation\n");
        output.push_str("# TYPE validation_failures_total counter\n");
        output.push_str(&format!(
            "validation_failures_total {}\n",
            self.validation_failures.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP upstream_failures_total Non-OK origin responses\n");
        output.push_str("# TYPE upstream_failures_total counter\n");
        output.push_str(&format!(
            "upstream_failures_total {}\n",
            self.upstream_failures.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP active_requests Requests currently in flight\n");
        output.push_str("# TYPE active_requests gauge\n");
        output.push_str(&format!(
            "active_requests {}\n",
            self.active_requests.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP http_request_duration_seconds Request duration\n");
        output.push_str("# TYPE http_request_duration_seconds summary\n");
        output.push_str(&format!(
            "http_request_duration_seconds_sum {:.6}\n",
            self.duration_sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
        ));
        output.push_str(&format!(
            "http_request_duration_seconds_count {}\n",
            self.duration_count.load(Ordering::Relaxed)
        ));

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
