//! Render job definitions and job-level state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::scene::{SceneState, SceneStatus, SceneUpdate};

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render job status.
///
/// `Error` is set by the pipeline itself (cost ceiling, scene failure,
/// assembly failure). `Failed` is set by the executor when the pipeline
/// could not report for itself (watchdog timeout, panic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    /// Job created, no scene started yet
    #[default]
    Queued,
    /// Scenes are being generated
    Rendering,
    /// Final artifact is being assembled
    Assembling,
    /// Job finished successfully
    Complete,
    /// Executor-level failure
    Failed,
    /// Pipeline-level failure
    Error,
}

impl RenderStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Queued => "queued",
            RenderStatus::Rendering => "rendering",
            RenderStatus::Assembling => "assembling",
            RenderStatus::Complete => "complete",
            RenderStatus::Failed => "failed",
            RenderStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RenderStatus::Complete | RenderStatus::Failed | RenderStatus::Error
        )
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a render job as returned to pollers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    /// Job ID
    pub job_id: JobId,
    /// Current job status
    pub status: RenderStatus,
    /// Per-scene state, fixed in length at creation
    pub scenes: Vec<SceneState>,
    /// Error message (if the job failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Non-fatal stage failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RenderJob {
    /// Create a queued job with `scene_count` pending scenes.
    pub fn new(job_id: JobId, scene_count: usize) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: RenderStatus::Queued,
            scenes: (0..scene_count as u32).map(SceneState::pending).collect(),
            error_message: None,
            warnings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial job update in place.
    pub fn apply(&mut self, update: JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(error) = update.error_message {
            self.error_message = Some(error);
        }
        if let Some(warning) = update.warning {
            self.warnings.push(warning);
        }
        self.updated_at = Utc::now();
    }

    /// Merge a partial scene update in place.
    ///
    /// Returns `false` if the scene does not exist or the status
    /// transition was rejected.
    pub fn apply_scene(&mut self, scene_id: u32, update: SceneUpdate) -> bool {
        let Some(scene) = self.scenes.get_mut(scene_id as usize) else {
            return false;
        };
        let applied = scene.apply(update);
        if applied {
            self.updated_at = Utc::now();
        }
        applied
    }

    /// Number of scenes that reached `complete`.
    pub fn completed_scenes(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.status == SceneStatus::Complete)
            .count()
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Partial update applied to a [`RenderJob`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<RenderStatus>,
    pub error_message: Option<String>,
    pub warning: Option<String>,
}

impl JobUpdate {
    /// Update that only changes status.
    pub fn status(status: RenderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Update that marks the job failed with the given status and message.
    pub fn failure(status: RenderStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            error_message: Some(message.into()),
            warning: None,
        }
    }

    /// Update that records a non-fatal warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            warning: Some(message.into()),
            ..Default::default()
        }
    }
}
