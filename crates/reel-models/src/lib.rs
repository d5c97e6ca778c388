//! Shared data models for the Reel render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Planned scenes and their visual directives
//! - Render jobs and per-scene state
//! - Render modes and style presets
//! - Generated assets and their on-disk layout
//! - Subtitle cues, cost estimates and progress messages

pub mod asset;
pub mod cost;
pub mod error;
pub mod job;
pub mod layout;
pub mod mode;
pub mod progress;
pub mod request;
pub mod scene;
pub mod style;
pub mod subtitle;

// Re-export common types
pub use asset::{AssetKind, GeneratedAsset};
pub use cost::CostEstimate;
pub use error::{ModelError, ModelResult};
pub use job::{JobId, JobUpdate, RenderJob, RenderStatus};
pub use layout::ArtifactLayout;
pub use mode::RenderMode;
pub use progress::ProgressUpdate;
pub use request::RenderRequest;
pub use scene::{Mood, Scene, SceneState, SceneStatus, SceneUpdate};
pub use style::{PresetSpec, StylePreset};
pub use subtitle::SubtitleCue;
