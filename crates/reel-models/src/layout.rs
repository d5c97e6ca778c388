//! Deterministic on-disk artifact layout.
//!
//! Per-scene intermediates are keyed by `(job_id, scene_index)`; final
//! outputs are keyed by `job_id` alone.

use std::path::{Path, PathBuf};

use crate::job::JobId;

/// Root of the media tree plus the naming templates below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Per-scene intermediates

    pub fn scene_audio(&self, job_id: &JobId, scene: u32) -> PathBuf {
        self.root
            .join("audio/narration")
            .join(format!("scene_{}_{}.mp3", scene, job_id))
    }

    pub fn scene_image(&self, job_id: &JobId, scene: u32) -> PathBuf {
        self.root
            .join("images")
            .join(format!("scene_{}_{}.png", scene, job_id))
    }

    pub fn scene_video(&self, job_id: &JobId, scene: u32) -> PathBuf {
        self.root
            .join("video/scenes")
            .join(format!("scene_{}_{}.mp4", scene, job_id))
    }

    pub fn scene_looped_video(&self, job_id: &JobId, scene: u32) -> PathBuf {
        self.root
            .join("video/looped")
            .join(format!("scene_{}_{}_looped.mp4", scene, job_id))
    }

    pub fn scene_subtitles(&self, job_id: &JobId, scene: u32) -> PathBuf {
        self.output_dir()
            .join(format!("scene_{}_{}.srt", scene, job_id))
    }

    // Assembly intermediates

    pub fn video_list(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("video_list_{}.txt", job_id))
    }

    pub fn audio_list(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("audio_list_{}.txt", job_id))
    }

    pub fn stitched_video(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("temp_video_{}.mp4", job_id))
    }

    // Final artifacts

    pub fn final_video(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("final_{}.mp4", job_id))
    }

    pub fn final_audio(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("narration_{}.mp3", job_id))
    }

    pub fn final_subtitles(&self, job_id: &JobId) -> PathBuf {
        self.output_dir().join(format!("final_{}.srt", job_id))
    }

    pub fn thumbnail(&self, job_id: &JobId) -> PathBuf {
        self.root
            .join("thumbs")
            .join(format!("thumb_{}.jpg", job_id))
    }

    pub fn short(&self, job_id: &JobId) -> PathBuf {
        self.root
            .join("video/shorts")
            .join(format!("short_{}.mp4", job_id))
    }

    pub fn description(&self, job_id: &JobId) -> PathBuf {
        self.output_dir()
            .join(format!("description_{}.txt", job_id))
    }

    pub fn error_log(&self, job_id: &JobId) -> PathBuf {
        self.root
            .join("errors")
            .join(format!("render_{}.log", job_id))
    }

    fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new("media")
    }
}
