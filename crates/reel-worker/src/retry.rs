//! Bounded retry with a fixed delay.
//!
//! Wraps a single external call. Retries are invisible to job state;
//! only the final failure is returned.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::metrics::record_retry;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Wait between attempts.
    pub delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(2000),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Same policy under a different operation name.
    pub fn named(&self, operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..self.clone()
        }
    }
}

/// Execute an async operation, retrying failures up to `max_retries` times.
///
/// Returns the error of the last attempt once retries run out.
///
/// # Example
/// ```ignore
/// let config = RetryConfig::new("tts").with_max_retries(2);
/// let audio = retry_async(&config, || speech.synthesize(text, &path)).await?;
/// ```
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut remaining = config.max_retries;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if remaining > 0 => {
                remaining -= 1;
                debug!(
                    "{} failed, retrying in {:?} ({} left): {}",
                    config.operation_name, config.delay, remaining, e
                );
                record_retry(&config.operation_name);
                tokio::time::sleep(config.delay).await;
            }
            Err(e) => {
                warn!(
                    "{} failed after {} attempts: {}",
                    config.operation_name,
                    config.max_retries + 1,
                    e
                );
                return Err(e);
            }
        }
    }
}
