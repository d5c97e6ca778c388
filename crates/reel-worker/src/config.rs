//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent render jobs
    pub max_concurrent_jobs: usize,
    /// Watchdog deadline for a single job
    pub job_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// How long finished jobs stay pollable
    pub job_retention: Duration,
    /// Root directory for intermediates and final artifacts
    pub media_root: PathBuf,
    /// Default cost ceiling when a request carries none
    pub plan_limit_usd: f64,
    /// Rate applied to narrated minutes
    pub cost_per_minute_usd: f64,
    /// Retries per external call (not counting the first attempt)
    pub retry_attempts: u32,
    /// Fixed delay between retries
    pub retry_delay: Duration,
    /// Per-invocation FFmpeg timeout
    pub ffmpeg_timeout: Duration,
    /// Enables Redis progress publishing when set
    pub redis_url: Option<String>,
    /// Enables the Prometheus exporter when set
    pub metrics_port: Option<u16>,
    /// Pins scene durations
    pub planner_seed: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            job_timeout: Duration::from_secs(3600), // 1 hour
            shutdown_timeout: Duration::from_secs(30),
            job_retention: Duration::from_secs(86400), // 24 hours
            media_root: PathBuf::from("media"),
            plan_limit_usd: 10.0,
            cost_per_minute_usd: 0.50,
            retry_attempts: 2,
            retry_delay: Duration::from_millis(2000),
            ffmpeg_timeout: Duration::from_secs(600),
            redis_url: None,
            metrics_port: None,
            planner_seed: None,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS").unwrap_or(defaults.max_concurrent_jobs),
            job_timeout: env_parse("WORKER_JOB_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            shutdown_timeout: env_parse("WORKER_SHUTDOWN_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
            job_retention: env_parse("WORKER_JOB_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
            media_root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            plan_limit_usd: env_parse("PLAN_LIMIT_USD").unwrap_or(defaults.plan_limit_usd),
            cost_per_minute_usd: env_parse("COST_PER_MINUTE_USD")
                .unwrap_or(defaults.cost_per_minute_usd),
            retry_attempts: env_parse("RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            retry_delay: env_parse("RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            ffmpeg_timeout: env_parse("FFMPEG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            metrics_port: env_parse("METRICS_PORT"),
            planner_seed: env_parse("PLANNER_SEED"),
        }
    }

    /// Retry policy applied at each external call site.
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new("provider_call")
            .with_max_retries(self.retry_attempts)
            .with_delay(self.retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.job_timeout, Duration::from_secs(3600));
        assert_eq!(config.job_retention, Duration::from_secs(86400));
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.cost_per_minute_usd, 0.50);

        let retry = config.retry();
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.delay, Duration::from_millis(2000));
    }
}
