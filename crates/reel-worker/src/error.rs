//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use reel_media::MediaError;
use reel_models::{ModelError, RenderStatus};
use reel_providers::ProviderError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cost limit exceeded: estimated ${estimated_usd:.2} > limit ${limit_usd:.2}")]
    CostExceeded { estimated_usd: f64, limit_usd: f64 },

    #[error("Provider error: {0}")]
    Provider(ProviderError),

    #[error("All {modality} providers failed after {attempts} attempts: {last_error}")]
    ProviderExhausted {
        modality: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Required media missing: {0}")]
    MediaMissing(PathBuf),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("Job timed out after {0}s")]
    Timeout(u64),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Terminal job status this error leads to.
    ///
    /// Executor-level failures map to `Failed`; everything the pipeline
    /// detects itself maps to `Error`.
    pub fn terminal_status(&self) -> RenderStatus {
        match self {
            WorkerError::Timeout(_) | WorkerError::JobFailed(_) => RenderStatus::Failed,
            _ => RenderStatus::Error,
        }
    }
}

impl From<MediaError> for WorkerError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::FileNotFound(path) => WorkerError::MediaMissing(path),
            other => WorkerError::Media(other),
        }
    }
}

impl From<ProviderError> for WorkerError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Exhausted {
                modality,
                attempts,
                last_error,
            } => WorkerError::ProviderExhausted {
                modality: modality.to_string(),
                attempts,
                last_error,
            },
            ProviderError::Media(media) => media.into(),
            other => WorkerError::Provider(other),
        }
    }
}

impl From<ModelError> for WorkerError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => WorkerError::Validation(msg),
            other => WorkerError::Validation(other.to_string()),
        }
    }
}
