//! Generated media assets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of asset produced by a scene step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Audio,
    Image,
    Video,
    LoopedVideo,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Image => "image",
            AssetKind::Video => "video",
            AssetKind::LoopedVideo => "looped_video",
        }
    }
}

/// A file written by a generation or transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedAsset {
    pub kind: AssetKind,
    pub path: PathBuf,
    /// Duration in seconds (0 for stills or when unknown)
    pub duration: f64,
}

impl GeneratedAsset {
    pub fn new(kind: AssetKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            duration: 0.0,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }
}
