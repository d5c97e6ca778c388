//! HTTP helpers shared by provider adapters.

use base64::Engine;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Bounded polling budget for async-job providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait before each poll
    pub interval: Duration,
    /// Polls before giving up
    pub max_attempts: u32,
}

impl PollConfig {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Outcome of one status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus<T> {
    Pending,
    Ready(T),
    Failed(String),
}

/// Poll `check` until it reports a terminal status or the budget runs out.
pub async fn poll_until<T, F, Fut>(
    provider: &'static str,
    config: PollConfig,
    mut check: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ProviderResult<PollStatus<T>>>,
{
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match check().await? {
            PollStatus::Ready(value) => return Ok(value),
            PollStatus::Failed(message) => return Err(ProviderError::job_failed(provider, message)),
            PollStatus::Pending => {
                debug!(provider, attempt, "Generation still pending");
            }
        }
    }

    Err(ProviderError::PollTimeout {
        provider,
        attempts: config.max_attempts,
    })
}

/// Turn a non-2xx response into [`ProviderError::RequestFailed`].
pub async fn ensure_success(provider: &'static str, response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::RequestFailed {
        provider,
        status: status.as_u16(),
        body,
    })
}

/// Write bytes to `output`, creating parent directories.
pub async fn write_asset(output: &Path, bytes: &[u8]) -> ProviderResult<PathBuf> {
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, bytes).await?;
    Ok(output.to_path_buf())
}

/// Download `url` to `output`.
pub async fn download(
    http: &Client,
    provider: &'static str,
    url: &str,
    output: &Path,
) -> ProviderResult<PathBuf> {
    debug!(provider, url, "Downloading generated asset");
    let response = ensure_success(provider, http.get(url).send().await?).await?;
    let bytes = response.bytes().await?;
    write_asset(output, &bytes).await
}

/// Read a PNG into a `data:` URI for image-to-video inputs.
pub async fn png_data_uri(path: &Path) -> ProviderResult<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}
