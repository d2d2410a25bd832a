//! Prometheus metrics for the worker.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const ITEMS_RECEIVED_TOTAL: &str = "vframe_items_received_total";
    pub const ITEMS_PROCESSED_TOTAL: &str = "vframe_items_processed_total";
    pub const CLAIM_FAILURES_TOTAL: &str = "vframe_claim_failures_total";
    pub const STAGE_DURATION_SECONDS: &str = "vframe_stage_duration_seconds";
    pub const FRAMES_EXTRACTED_TOTAL: &str = "vframe_frames_extracted_total";
    pub const NOTIFICATIONS_FAILED_TOTAL: &str = "vframe_notifications_failed_total";
}

/// Serve `/metrics` on `0.0.0.0:{port}`.
pub fn init_metrics(port: u16) -> WorkerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))
}

pub fn record_received(count: usize) {
    counter!(names::ITEMS_RECEIVED_TOTAL).increment(count as u64);
}

/// `outcome` is `success`, `empty` or the failing stage.
pub fn record_outcome(outcome: &str) {
    counter!(names::ITEMS_PROCESSED_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

pub fn record_claim_failure() {
    counter!(names::CLAIM_FAILURES_TOTAL).increment(1);
}

pub fn record_stage(stage: &'static str, elapsed: Duration) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(elapsed.as_secs_f64());
}

pub fn record_frames(count: usize) {
    counter!(names::FRAMES_EXTRACTED_TOTAL).increment(count as u64);
}

pub fn record_notification_failure() {
    counter!(names::NOTIFICATIONS_FAILED_TOTAL).increment(1);
}
