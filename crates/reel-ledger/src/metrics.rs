//! Ledger metrics collection.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total ledger requests by backend, operation and outcome.
    pub const REQUESTS_TOTAL: &str = "ledger_requests_total";

    /// Request latency in seconds by backend and operation.
    pub const LATENCY_SECONDS: &str = "ledger_latency_seconds";
}

/// Record metrics for a completed ledger request.
pub fn record_request(backend: &'static str, operation: &'static str, ok: bool, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "backend" => backend,
        "operation" => operation,
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "backend" => backend,
        "operation" => operation
    )
    .record(latency_ms / 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("memory", "contains", true, 1.0);
    }
}
