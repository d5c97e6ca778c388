//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: credentials not configured")]
    MissingCredentials { provider: &'static str },

    #[error("{provider}: request failed with {status}: {body}")]
    RequestFailed {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider}: invalid response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: generation failed: {message}")]
    JobFailed {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: timed out after {attempts} polls")]
    PollTimeout { provider: &'static str, attempts: u32 },

    #[error("all {modality} providers failed after {attempts} attempts: {last_error}")]
    Exhausted {
        modality: &'static str,
        attempts: u32,
        last_error: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),
}

impl ProviderError {
    pub fn invalid_response(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }

    pub fn job_failed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::JobFailed {
            provider,
            message: message.into(),
        }
    }
}
