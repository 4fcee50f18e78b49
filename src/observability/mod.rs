//! Observability
//!
//! Structured JSON logging with a process-wide severity threshold, and
//! per-client counters.
//!
//! ```ignore
//! use dataapi::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::info("OPERATION_COMPLETED", &[("code", "0")]);
//! ```

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::{ClientMetrics, MetricsSnapshot};

#[cfg(test)]
pub(crate) use logger::capture_log;
