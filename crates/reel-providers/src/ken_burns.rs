//! Local Ken Burns animation for `VIDEO_PROVIDER=mock`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use reel_media::{MediaToolchain, Transform, TransformSpec};

use crate::error::ProviderResult;
use crate::provider::{Provider, VideoProvider, VideoRequest};

const NAME: &str = "ken_burns";
const CLIP_SECS: f64 = 5.0;
const FPS: u32 = 25;

/// Animates the scene still with a slow zoom instead of calling an API.
///
/// Even scenes zoom in, odd scenes zoom out.
#[derive(Clone)]
pub struct KenBurns {
    toolchain: Arc<dyn MediaToolchain>,
}

impl KenBurns {
    pub fn new(toolchain: Arc<dyn MediaToolchain>) -> Self {
        Self { toolchain }
    }
}

impl Provider for KenBurns {
    fn name(&self) -> &'static str {
        NAME
    }
}

#[async_trait]
impl VideoProvider for KenBurns {
    async fn animate(&self, request: &VideoRequest, output: &Path) -> ProviderResult<PathBuf> {
        info!(scene = request.scene_index, "Animating still locally");

        let spec = TransformSpec::new(
            &request.image,
            output,
            Transform::KenBurns {
                duration: CLIP_SECS,
                fps: FPS,
                zoom_in: request.scene_index % 2 == 0,
            },
        );
        self.toolchain.transform(&spec).await?;

        Ok(output.to_path_buf())
    }
}
