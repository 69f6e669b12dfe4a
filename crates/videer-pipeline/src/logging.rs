//! Structured job logging.

use tracing::{error, info, warn, Span};

use videer_models::{JobId, JobStage};

/// Job logger with consistent, job-scoped formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
        }
    }

    /// Log a stage transition.
    pub fn log_stage(&self, stage: JobStage) {
        info!(job_id = %self.job_id, stage = %stage, "job stage changed");
    }

    /// Log a progress message.
    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, "{}", message);
    }

    /// Log a recoverable problem.
    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, "{}", message);
    }

    /// Log a job failure.
    pub fn log_error(&self, stage: JobStage, message: &str) {
        error!(job_id = %self.job_id, stage = %stage, "job failed: {}", message);
    }

    /// Log job completion.
    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, "job completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id)
    }
}
