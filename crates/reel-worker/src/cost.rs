//! Cost estimation and the pre-flight budget gate.

use reel_models::{CostEstimate, Scene};

use crate::error::{WorkerError, WorkerResult};

/// Default rate in USD per narrated minute.
pub const DEFAULT_COST_PER_MINUTE_USD: f64 = 0.50;

/// Linear cost model over narrated minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostGuard {
    per_minute_usd: f64,
}

impl CostGuard {
    pub fn new(per_minute_usd: f64) -> Self {
        Self { per_minute_usd }
    }

    /// Estimate for a total number of minutes.
    pub fn estimate_minutes(&self, total_minutes: f64) -> CostEstimate {
        CostEstimate {
            total_minutes,
            estimated_usd: total_minutes * self.per_minute_usd,
        }
    }

    /// Estimate from planned scene durations.
    pub fn estimate(&self, scenes: &[Scene]) -> CostEstimate {
        let total_secs: u64 = scenes.iter().map(|s| u64::from(s.duration)).sum();
        self.estimate_minutes(total_secs as f64 / 60.0)
    }

    /// Reject estimates strictly over `limit_usd`.
    pub fn check(&self, estimate: &CostEstimate, limit_usd: f64) -> WorkerResult<()> {
        if estimate.within(limit_usd) {
            Ok(())
        } else {
            Err(WorkerError::CostExceeded {
                estimated_usd: estimate.estimated_usd,
                limit_usd,
            })
        }
    }
}

impl Default for CostGuard {
    fn default() -> Self {
        Self::new(DEFAULT_COST_PER_MINUTE_USD)
    }
}
