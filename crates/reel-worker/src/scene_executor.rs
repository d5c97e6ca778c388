//! Per-scene asset generation.
//!
//! Runs the steps a render mode asks for, in order: narration and
//! subtitles, scene still, animated clip looped to the narration. Each
//! external call is retried on its own; a step that still fails aborts
//! the scene.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use reel_media::{create_srt_file, loop_to_audio, MediaToolchain};
use reel_models::{
    ArtifactLayout, AssetKind, GeneratedAsset, JobId, RenderMode, Scene, StylePreset,
};
use reel_providers::{ImageRequest, ProviderRegistry, VideoRequest};

use crate::error::WorkerResult;
use crate::prompt::build_prompt;
use crate::retry::{retry_async, RetryConfig};

/// What one scene produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneOutput {
    pub assets: Vec<GeneratedAsset>,
    /// Scene subtitle file, when the audio step ran
    pub subtitles: Option<PathBuf>,
    /// Scene still, reported as the scene thumbnail
    pub thumbnail: Option<String>,
}

/// Drives one scene through its modality steps.
#[derive(Clone)]
pub struct SceneExecutor {
    providers: ProviderRegistry,
    toolchain: Arc<dyn MediaToolchain>,
    layout: ArtifactLayout,
    retry: RetryConfig,
}

impl SceneExecutor {
    pub fn new(
        providers: ProviderRegistry,
        toolchain: Arc<dyn MediaToolchain>,
        layout: ArtifactLayout,
        retry: RetryConfig,
    ) -> Self {
        Self {
            providers,
            toolchain,
            layout,
            retry,
        }
    }

    /// Generate every asset `mode` requires for `scene`.
    pub async fn execute(
        &self,
        job_id: &JobId,
        scene: &Scene,
        style: StylePreset,
        mode: RenderMode,
    ) -> WorkerResult<SceneOutput> {
        let mut output = SceneOutput::default();
        let prompt = build_prompt(scene, style);

        if mode.includes_audio() {
            let (audio, subtitles) = self.narrate(job_id, scene).await?;
            output.assets.push(audio);
            output.subtitles = Some(subtitles);
        }

        if mode.includes_image() {
            let image = self.still(job_id, scene, &prompt).await?;
            output.thumbnail = Some(image.path.display().to_string());
            output.assets.push(image);
        }

        if mode.includes_video() {
            let (clip, looped) = self.animate(job_id, scene, &prompt).await?;
            output.assets.push(clip);
            output.assets.push(looped);
        }

        Ok(output)
    }

    /// Narration audio, then subtitles timed to its probed duration.
    async fn narrate(&self, job_id: &JobId, scene: &Scene) -> WorkerResult<(GeneratedAsset, PathBuf)> {
        let audio_path = self.layout.scene_audio(job_id, scene.id);
        let chain = &self.providers.speech;
        let text = scene.narration.as_str();
        let output = audio_path.as_path();

        let speech = retry_async(&self.retry.named("speech"), move || {
            chain.run(move |provider| async move { provider.synthesize(text, output).await })
        })
        .await?;
        debug!(
            scene = scene.id,
            provider = speech.provider,
            characters = ?speech.value.characters,
            "Narration generated"
        );

        let duration = self.toolchain.probe(&audio_path).await;
        if duration <= 0.0 {
            warn!(scene = scene.id, path = %audio_path.display(), "Narration duration unknown, subtitles collapse to zero");
        }

        let subtitles = self.layout.scene_subtitles(job_id, scene.id);
        let cues = create_srt_file(&scene.narration, duration, &subtitles).await?;
        debug!(scene = scene.id, cues = cues.len(), duration, "Scene subtitles written");

        Ok((
            GeneratedAsset::new(AssetKind::Audio, audio_path).with_duration(duration),
            subtitles,
        ))
    }

    /// Scene still through the image chain.
    async fn still(&self, job_id: &JobId, scene: &Scene, prompt: &str) -> WorkerResult<GeneratedAsset> {
        let request = ImageRequest {
            prompt: prompt.to_string(),
            scene_index: scene.id,
        };
        let path = self.layout.scene_image(job_id, scene.id);
        let chain = &self.providers.images;
        let request_ref = &request;
        let output = path.as_path();

        let image = retry_async(&self.retry.named("image"), move || {
            chain.run(move |provider| async move { provider.generate(request_ref, output).await })
        })
        .await?;
        info!(scene = scene.id, provider = image.provider, "Scene image generated");

        Ok(GeneratedAsset::new(AssetKind::Image, image.value))
    }

    /// Animated clip through the video chain, looped to the narration.
    async fn animate(
        &self,
        job_id: &JobId,
        scene: &Scene,
        prompt: &str,
    ) -> WorkerResult<(GeneratedAsset, GeneratedAsset)> {
        let request = VideoRequest {
            prompt: prompt.to_string(),
            image: self.layout.scene_image(job_id, scene.id),
            duration: scene.duration,
            scene_index: scene.id,
        };
        let raw = self.layout.scene_video(job_id, scene.id);
        let chain = &self.providers.videos;
        let request_ref = &request;
        let output = raw.as_path();

        let clip = retry_async(&self.retry.named("video"), move || {
            chain.run(move |provider| async move { provider.animate(request_ref, output).await })
        })
        .await?;
        info!(scene = scene.id, provider = clip.provider, "Scene clip generated");

        let audio = self.layout.scene_audio(job_id, scene.id);
        let looped = self.layout.scene_looped_video(job_id, scene.id);
        let duration = loop_to_audio(self.toolchain.as_ref(), &clip.value, &audio, &looped).await?;

        Ok((
            GeneratedAsset::new(AssetKind::Video, clip.value),
            GeneratedAsset::new(AssetKind::LoopedVideo, looped).with_duration(duration),
        ))
    }
}
