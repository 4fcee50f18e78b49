//! Client call counters
//!
//! Monotonic counters, reset only when the client is built.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters of one client
#[derive(Debug, Default)]
pub struct ClientMetrics {
    requests_sent: AtomicU64,
    transport_failures: AtomicU64,
    malformed_responses: AtomicU64,
    application_errors: AtomicU64,
    script_stage_errors: AtomicU64,
    records_received: AtomicU64,
}

impl ClientMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transport_failures(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_malformed_responses(&self) {
        self.malformed_responses.fetch_add(1, Ordering::Relaxed);
    }

    /// A reply with a non-zero primary code
    pub fn increment_application_errors(&self) {
        self.application_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_script_stage_errors(&self) {
        self.script_stage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_received(&self, count: u64) {
        self.records_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            malformed_responses: self.malformed_responses.load(Ordering::Relaxed),
            application_errors: self.application_errors.load(Ordering::Relaxed),
            script_stage_errors: self.script_stage_errors.load(Ordering::Relaxed),
            records_received: self.records_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub transport_failures: u64,
    pub malformed_responses: u64,
    pub application_errors: u64,
    pub script_stage_errors: u64,
    pub records_received: u64,
}

impl MetricsSnapshot {
    /// JSON object with keys in declaration order
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        assert_eq!(ClientMetrics::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let metrics = ClientMetrics::new();
        metrics.increment_requests_sent();
        metrics.increment_requests_sent();
        metrics.increment_application_errors();
        metrics.add_records_received(7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_sent, 2);
        assert_eq!(snapshot.application_errors, 1);
        assert_eq!(snapshot.records_received, 7);
        assert_eq!(snapshot.transport_failures, 0);
    }

    #[test]
    fn test_to_json() {
        let metrics = ClientMetrics::new();
        metrics.increment_malformed_responses();
        let parsed: serde_json::Value = serde_json::from_str(&metrics.snapshot().to_json()).unwrap();
        assert_eq!(parsed["malformed_responses"], 1);
    }
}
