//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use reel_models::{JobId, RenderRequest};

/// Job to render a script into a narrated video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderVideoJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Validated submission payload
    pub request: RenderRequest,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl RenderVideoJob {
    /// Create a new render job with a fresh ID.
    pub fn new(request: RenderRequest) -> Self {
        Self::with_id(JobId::new(), request)
    }

    /// Create a render job for an already-assigned ID.
    pub fn with_id(job_id: JobId, request: RenderRequest) -> Self {
        Self {
            job_id,
            request,
            created_at: Utc::now(),
        }
    }

    /// Generate idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("render:{}", self.job_id)
    }
}
