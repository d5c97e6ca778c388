//! Capability traits for generation providers.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::ProviderResult;

/// Identity and readiness shared by every provider.
pub trait Provider: Send + Sync {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Whether the provider has what it needs to be called.
    /// Keyless providers always return `true`.
    fn has_credentials(&self) -> bool {
        true
    }
}

/// Result of a text-to-speech call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOutput {
    pub path: PathBuf,
    /// Billed character count, when reported
    pub characters: Option<u64>,
    /// Provider request id, when reported
    pub request_id: Option<String>,
}

/// Text-to-speech.
#[async_trait]
pub trait SpeechProvider: Provider {
    async fn synthesize(&self, text: &str, output: &Path) -> ProviderResult<SpeechOutput>;
}

/// Text-to-image input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// 0-based scene index (seeds keyless providers)
    pub scene_index: u32,
}

/// Text-to-image.
#[async_trait]
pub trait ImageProvider: Provider {
    async fn generate(&self, request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf>;
}

/// Image-to-video input.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub prompt: String,
    /// Scene still to animate
    pub image: PathBuf,
    /// Requested clip length in seconds
    pub duration: u32,
    pub scene_index: u32,
}

/// Image-to-video.
#[async_trait]
pub trait VideoProvider: Provider {
    async fn animate(&self, request: &VideoRequest, output: &Path) -> ProviderResult<PathBuf>;
}
