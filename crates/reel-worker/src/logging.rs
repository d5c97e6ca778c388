//! Job-scoped logging.
//!
//! Every line carries the job id and the operation so a single render
//! can be followed through interleaved output.

use tracing::{error, info, warn, Span};

use reel_models::JobId;

/// Structured logger bound to one job.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.clone(),
            operation,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, "Render started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, "{}", message);
    }

    /// `scene` is 0-based; the message shows it 1-based.
    pub fn log_scene(&self, scene: u32, total: u32, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            scene,
            "Scene {}/{} {}",
            scene + 1,
            total,
            message
        );
    }

    /// Non-fatal stage failure.
    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, operation = self.operation, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, operation = self.operation, "Render failed: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, operation = self.operation, "Render complete: {}", message);
    }

    /// Span that every event of the run is recorded under.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("render_job", job_id = %self.job_id, operation = self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_keeps_job_context() {
        let job_id = JobId::from_string("job-42");
        let logger = JobLogger::new(&job_id, "render");

        assert_eq!(logger.job_id(), &job_id);
        assert_eq!(logger.operation(), "render");
        logger.log_scene(0, 3, "rendering");
    }
}
