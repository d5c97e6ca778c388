//! Prometheus metrics for the render worker.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use reel_models::{RenderMode, RenderStatus};

use crate::error::{WorkerError, WorkerResult};

/// Install the Prometheus recorder and serve `/metrics` on `port`.
pub fn init_metrics(port: u16) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    // Job metrics
    pub const JOBS_SUBMITTED_TOTAL: &str = "reel_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "reel_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "reel_jobs_failed_total";
    pub const JOBS_IN_FLIGHT: &str = "reel_jobs_in_flight";
    pub const JOB_DURATION_SECONDS: &str = "reel_job_duration_seconds";
    pub const COST_REJECTED_TOTAL: &str = "reel_cost_rejected_total";

    // Scene metrics
    pub const SCENE_DURATION_SECONDS: &str = "reel_scene_duration_seconds";
    pub const RETRIES_TOTAL: &str = "reel_retries_total";

    // Stage metrics
    pub const STAGE_WARNINGS_TOTAL: &str = "reel_stage_warnings_total";
}

/// Record a job accepted for execution.
pub fn record_job_submitted(mode: RenderMode) {
    counter!(names::JOBS_SUBMITTED_TOTAL, "mode" => mode.as_str()).increment(1);
}

/// Record a job that reached `complete`.
pub fn record_job_completed(mode: RenderMode, duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL, "mode" => mode.as_str()).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "mode" => mode.as_str()).record(duration_secs);
}

/// Record a job that ended in `error` or `failed`.
pub fn record_job_failed(status: RenderStatus) {
    counter!(names::JOBS_FAILED_TOTAL, "status" => status.as_str()).increment(1);
}

/// Update the in-flight jobs gauge.
pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}

/// Record a job rejected by the cost guard.
pub fn record_cost_rejected() {
    counter!(names::COST_REJECTED_TOTAL).increment(1);
}

/// Record wall time for one scene.
pub fn record_scene_duration(mode: RenderMode, duration_secs: f64) {
    histogram!(names::SCENE_DURATION_SECONDS, "mode" => mode.as_str()).record(duration_secs);
}

/// Record a retried external call.
pub fn record_retry(operation: &str) {
    let labels = [("operation", operation.to_string())];
    counter!(names::RETRIES_TOTAL, &labels).increment(1);
}

/// Record a non-fatal stage failure.
pub fn record_stage_warning(stage: &'static str) {
    counter!(names::STAGE_WARNINGS_TOTAL, "stage" => stage).increment(1);
}
