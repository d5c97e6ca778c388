//! Planned scenes and per-scene render state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual mood derived from narration keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Intense,
    Ominous,
    #[default]
    Cinematic,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Intense => "intense",
            Mood::Ominous => "ominous",
            Mood::Cinematic => "cinematic",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One narrated segment of the target video. Immutable once planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Ordinal position in the script (0-based)
    pub id: u32,
    /// Narration text for this scene
    pub narration: String,
    /// Estimated duration in seconds
    pub duration: u32,
    /// Derived mood
    pub mood: Mood,
    /// Camera directive
    pub camera: String,
    /// Action / environment directive
    pub action: String,
}

/// Scene processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Pending,
    Rendering,
    Complete,
    Failed,
}

impl SceneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::Rendering => "rendering",
            SceneStatus::Complete => "complete",
            SceneStatus::Failed => "failed",
        }
    }

    /// Transitions only move forward, except the explicit failure edge.
    /// Nothing leaves `Complete` or `Failed`.
    pub fn can_transition_to(&self, next: SceneStatus) -> bool {
        use SceneStatus::*;
        match (*self, next) {
            (a, b) if a == b => true,
            (Complete, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Pending, Rendering) | (Pending, Complete) | (Rendering, Complete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-scene state tracked inside a render job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneState {
    pub id: u32,
    pub status: SceneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl SceneState {
    pub fn pending(id: u32) -> Self {
        Self {
            id,
            status: SceneStatus::Pending,
            thumbnail: None,
        }
    }

    /// Merge an update, rejecting status regressions.
    pub fn apply(&mut self, update: SceneUpdate) -> bool {
        if let Some(status) = update.status {
            if !self.status.can_transition_to(status) {
                return false;
            }
            self.status = status;
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        true
    }
}

/// Partial update applied to a [`SceneState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneUpdate {
    pub status: Option<SceneStatus>,
    pub thumbnail: Option<String>,
}

impl SceneUpdate {
    pub fn status(status: SceneStatus) -> Self {
        Self {
            status: Some(status),
            thumbnail: None,
        }
    }

    pub fn complete(thumbnail: Option<String>) -> Self {
        Self {
            status: Some(SceneStatus::Complete),
            thumbnail,
        }
    }
}
