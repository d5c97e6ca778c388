//! Cost estimate for a planned render.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Derived cost figure, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub total_minutes: f64,
    #[serde(rename = "estimatedUSD")]
    pub estimated_usd: f64,
}

impl CostEstimate {
    /// Whether this estimate fits under `limit_usd`.
    pub fn within(&self, limit_usd: f64) -> bool {
        self.estimated_usd <= limit_usd
    }
}
