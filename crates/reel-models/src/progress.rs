//! Progress messages broadcast to subscribers.
//!
//! Wire shape matches the polling UI: `{status, scene?, totalScenes?}`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::RenderStatus;

/// A single state-transition notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub status: RenderStatus,
    /// 1-based scene number currently rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_scenes: Option<u32>,
    /// Free-form detail (errors, warnings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressUpdate {
    /// Create a bare status update.
    pub fn status(status: RenderStatus) -> Self {
        Self {
            status,
            scene: None,
            total_scenes: None,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a scene-rendering update. `scene_index` is 0-based.
    pub fn scene(scene_index: u32, total_scenes: u32) -> Self {
        Self {
            scene: Some(scene_index + 1),
            total_scenes: Some(total_scenes),
            ..Self::status(RenderStatus::Rendering)
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_update_is_one_based() {
        let update = ProgressUpdate::scene(0, 2);
        assert_eq!(update.status, RenderStatus::Rendering);
        assert_eq!(update.scene, Some(1));
        assert_eq!(update.total_scenes, Some(2));
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_string(&ProgressUpdate::scene(1, 3)).unwrap();
        assert!(json.contains("\"status\":\"rendering\""));
        assert!(json.contains("\"scene\":2"));
        assert!(json.contains("\"totalScenes\":3"));
        assert!(!json.contains("message"));
    }
}
