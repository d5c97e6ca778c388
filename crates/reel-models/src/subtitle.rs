//! Subtitle cue type.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A timed caption entry. Cue indices are 1-based as in SRT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleCue {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleCue {
    /// Return a copy shifted forward by `offset_ms`.
    pub fn shifted(&self, offset_ms: u64) -> Self {
        Self {
            index: self.index,
            start_ms: self.start_ms + offset_ms,
            end_ms: self.end_ms + offset_ms,
            text: self.text.clone(),
        }
    }
}
