//! Final artifact assembly.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use reel_models::{ArtifactLayout, JobId};

use crate::error::{MediaError, MediaResult};
use crate::subtitle::{merge_srt_files, SubtitleTrack};
use crate::toolchain::{ConcatCodec, ConcatSpec, MediaToolchain, Transform, TransformSpec};

/// Seconds into the final video where the thumbnail is sampled.
pub const THUMBNAIL_OFFSET_SECS: f64 = 1.0;

/// Paths produced by [`MediaAssembler::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOutput {
    pub video: PathBuf,
    pub audio: PathBuf,
    /// Probed duration of the muxed video
    pub duration: f64,
}

/// Concatenates per-scene assets into the job's final artifacts.
#[derive(Clone)]
pub struct MediaAssembler {
    toolchain: Arc<dyn MediaToolchain>,
    layout: ArtifactLayout,
}

impl MediaAssembler {
    pub fn new(toolchain: Arc<dyn MediaToolchain>, layout: ArtifactLayout) -> Self {
        Self { toolchain, layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Concatenate every scene's looped video and narration, then mux.
    ///
    /// Every scene must have both assets; a missing one fails with
    /// [`MediaError::FileNotFound`]. Intermediates are removed on success
    /// and left in place on failure.
    pub async fn assemble(&self, job_id: &JobId, scene_count: u32) -> MediaResult<AssembledOutput> {
        let mut videos = Vec::with_capacity(scene_count as usize);
        let mut audios = Vec::with_capacity(scene_count as usize);

        for scene in 0..scene_count {
            let video = self.layout.scene_looped_video(job_id, scene);
            let audio = self.layout.scene_audio(job_id, scene);
            require(&video).await?;
            require(&audio).await?;
            videos.push(video);
            audios.push(audio);
        }

        let video_list = self.layout.video_list(job_id);
        let audio_list = self.layout.audio_list(job_id);
        let stitched = self.layout.stitched_video(job_id);
        let final_audio = self.layout.final_audio(job_id);
        let final_video = self.layout.final_video(job_id);

        self.toolchain
            .concat(&ConcatSpec {
                inputs: videos,
                list_file: video_list.clone(),
                output: stitched.clone(),
                codec: ConcatCodec::Copy,
            })
            .await?;
        debug!(job_id = %job_id, "Concatenated scene videos");

        self.toolchain
            .concat(&ConcatSpec {
                inputs: audios,
                list_file: audio_list.clone(),
                output: final_audio.clone(),
                codec: ConcatCodec::Mp3,
            })
            .await?;
        debug!(job_id = %job_id, "Concatenated scene narration");

        self.toolchain
            .transform(
                &TransformSpec::new(&stitched, &final_video, Transform::MuxShortest)
                    .with_input(&final_audio),
            )
            .await?;

        for temp in [&video_list, &audio_list, &stitched] {
            remove_if_present(temp).await;
        }

        let duration = self.toolchain.probe(&final_video).await;
        info!(job_id = %job_id, duration, "Assembled final video");

        Ok(AssembledOutput {
            video: final_video,
            audio: final_audio,
            duration,
        })
    }

    /// Merge per-scene subtitles into the job's master track.
    pub async fn merge_subtitles(&self, job_id: &JobId, scene_count: u32) -> MediaResult<PathBuf> {
        let tracks: Vec<SubtitleTrack> = (0..scene_count)
            .map(|scene| SubtitleTrack {
                subtitles: self.layout.scene_subtitles(job_id, scene),
                audio: self.layout.scene_audio(job_id, scene),
            })
            .collect();
        let output = self.layout.final_subtitles(job_id);

        let cues = merge_srt_files(&tracks, &output, self.toolchain.as_ref()).await?;
        debug!(job_id = %job_id, cues, "Merged master subtitles");

        Ok(output)
    }

    /// Sample one frame of the final video.
    pub async fn thumbnail(&self, job_id: &JobId) -> MediaResult<PathBuf> {
        let source = self.layout.final_video(job_id);
        let output = self.layout.thumbnail(job_id);
        require(&source).await?;

        self.toolchain
            .transform(&TransformSpec::new(
                &source,
                &output,
                Transform::ExtractFrame {
                    at_secs: THUMBNAIL_OFFSET_SECS,
                },
            ))
            .await?;

        Ok(output)
    }

    /// Derive the vertical short, burning in `subtitles` when present.
    pub async fn vertical_short(&self, job_id: &JobId, subtitles: Option<&Path>) -> MediaResult<PathBuf> {
        let source = self.layout.final_video(job_id);
        let output = self.layout.short(job_id);
        require(&source).await?;

        let subtitles = match subtitles {
            Some(path) => {
                if tokio::fs::try_exists(path).await? {
                    Some(path.to_path_buf())
                } else {
                    warn!(job_id = %job_id, path = %path.display(), "Short subtitles missing, rendering without captions");
                    None
                }
            }
            None => None,
        };

        self.toolchain
            .transform(&TransformSpec::new(
                &source,
                &output,
                Transform::VerticalShort { subtitles },
            ))
            .await?;

        Ok(output)
    }
}

async fn require(path: &Path) -> MediaResult<()> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(MediaError::FileNotFound(path.to_path_buf()))
    }
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove intermediate: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Files hold their duration as text. Concat sums, mux takes the shorter.
    struct TextDurations;

    async fn read_secs(path: &Path) -> f64 {
        tokio::fs::read_to_string(path)
            .await
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0.0)
    }

    #[async_trait]
    impl MediaToolchain for TextDurations {
        async fn probe(&self, path: &Path) -> f64 {
            read_secs(path).await
        }

        async fn concat(&self, spec: &ConcatSpec) -> MediaResult<()> {
            let mut total = 0.0;
            for input in &spec.inputs {
                total += read_secs(input).await;
            }
            tokio::fs::create_dir_all(spec.output.parent().unwrap()).await?;
            tokio::fs::write(&spec.list_file, "list").await?;
            tokio::fs::write(&spec.output, total.to_string()).await?;
            Ok(())
        }

        async fn transform(&self, spec: &TransformSpec) -> MediaResult<()> {
            tokio::fs::create_dir_all(spec.output.parent().unwrap()).await?;
            let value = match &spec.transform {
                Transform::MuxShortest => {
                    read_secs(&spec.inputs[0]).await.min(read_secs(&spec.inputs[1]).await)
                }
                _ => read_secs(&spec.inputs[0]).await,
            };
            tokio::fs::write(&spec.output, value.to_string()).await?;
            Ok(())
        }
    }

    async fn seed_scene(layout: &ArtifactLayout, job: &JobId, scene: u32, secs: f64) {
        for path in [layout.scene_looped_video(job, scene), layout.scene_audio(job, scene)] {
            tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
            tokio::fs::write(&path, secs.to_string()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_assemble_removes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let job = JobId::from_string("job");
        seed_scene(&layout, &job, 0, 4.0).await;
        seed_scene(&layout, &job, 1, 6.0).await;

        let assembler = MediaAssembler::new(Arc::new(TextDurations), layout.clone());
        let out = assembler.assemble(&job, 2).await.unwrap();

        assert_eq!(out.video, layout.final_video(&job));
        assert_eq!(out.duration, 10.0);
        assert!(layout.final_audio(&job).exists());
        assert!(!layout.video_list(&job).exists());
        assert!(!layout.audio_list(&job).exists());
        assert!(!layout.stitched_video(&job).exists());

        let thumb = assembler.thumbnail(&job).await.unwrap();
        assert!(thumb.exists());
    }

    #[tokio::test]
    async fn test_assemble_missing_scene_asset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::new(dir.path());
        let job = JobId::from_string("job");
        seed_scene(&layout, &job, 0, 4.0).await;
        tokio::fs::remove_file(layout.scene_audio(&job, 0)).await.unwrap();

        let assembler = MediaAssembler::new(Arc::new(TextDurations), layout.clone());
        let err = assembler.assemble(&job, 1).await.unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(p) if p == layout.scene_audio(&job, 0)));
        assert!(!layout.final_video(&job).exists());
    }

    #[tokio::test]
    async fn test_short_without_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = MediaAssembler::new(Arc::new(TextDurations), ArtifactLayout::new(dir.path()));
        let err = assembler
            .vertical_short(&JobId::from_string("none"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
