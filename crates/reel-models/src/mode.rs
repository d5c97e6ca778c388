//! Render mode selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Which generation steps a render job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Narration audio and subtitles only
    Audio,
    /// Scene stills only
    Image,
    /// Narrated video: audio, image and video steps, then assembly
    Video,
    /// Everything, plus vertical short and chapter description
    #[default]
    Full,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Audio => "audio",
            RenderMode::Image => "image",
            RenderMode::Video => "video",
            RenderMode::Full => "full",
        }
    }

    /// Whether the audio + subtitle step runs.
    ///
    /// Video needs narration audio to loop-sync against.
    pub fn includes_audio(&self) -> bool {
        match self {
            RenderMode::Audio | RenderMode::Video | RenderMode::Full => true,
            RenderMode::Image => false,
        }
    }

    /// Whether the image step runs.
    ///
    /// Video providers animate the scene image, so video implies image.
    pub fn includes_image(&self) -> bool {
        match self {
            RenderMode::Image | RenderMode::Video | RenderMode::Full => true,
            RenderMode::Audio => false,
        }
    }

    /// Whether the video + loop-sync step runs.
    pub fn includes_video(&self) -> bool {
        match self {
            RenderMode::Video | RenderMode::Full => true,
            RenderMode::Audio | RenderMode::Image => false,
        }
    }

    /// Whether the final artifact is assembled.
    pub fn assembles(&self) -> bool {
        self.includes_video()
    }

    /// Whether the vertical short and chapter description are derived.
    pub fn derives_extras(&self) -> bool {
        matches!(self, RenderMode::Full)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "audio" => Ok(RenderMode::Audio),
            "image" => Ok(RenderMode::Image),
            "video" => Ok(RenderMode::Video),
            "full" => Ok(RenderMode::Full),
            other => Err(ModelError::InvalidMode(other.to_string())),
        }
    }
}
