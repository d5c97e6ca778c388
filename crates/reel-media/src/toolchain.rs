//! The media toolchain seam.
//!
//! Orchestration code only sees [`MediaToolchain`]: probe a duration,
//! concatenate an ordered file list, or run one of a fixed set of
//! filter-graph transforms. [`FfmpegToolchain`] is the subprocess-backed
//! implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Codec used for the concatenated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatCodec {
    /// Stream copy (same-codec video segments)
    Copy,
    /// Re-encode to MP3 (narration segments)
    Mp3,
}

/// An ordered concatenation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatSpec {
    pub inputs: Vec<PathBuf>,
    /// Concat-demuxer list file written for the run
    pub list_file: PathBuf,
    pub output: PathBuf,
    pub codec: ConcatCodec,
}

/// Supported transforms.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Repeat the input `loops` times and trim to `duration` seconds.
    StreamLoop { loops: u32, duration: f64 },
    /// Mux inputs[0] video with inputs[1] audio, bounded by the shorter track.
    MuxShortest,
    /// Grab one frame at `at_secs`.
    ExtractFrame { at_secs: f64 },
    /// 1080x1920 crop with optional burned-in captions.
    VerticalShort { subtitles: Option<PathBuf> },
    /// Animate a still with a slow zoom.
    KenBurns { duration: f64, fps: u32, zoom_in: bool },
}

impl Transform {
    pub fn name(&self) -> &'static str {
        match self {
            Transform::StreamLoop { .. } => "stream_loop",
            Transform::MuxShortest => "mux",
            Transform::ExtractFrame { .. } => "extract_frame",
            Transform::VerticalShort { .. } => "vertical_short",
            Transform::KenBurns { .. } => "ken_burns",
        }
    }
}

/// A transform applied to one or more inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSpec {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub transform: Transform,
}

impl TransformSpec {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, transform: Transform) -> Self {
        Self {
            inputs: vec![input.into()],
            output: output.into(),
            transform,
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }
}

/// Local media operations used by the pipeline.
#[async_trait]
pub trait MediaToolchain: Send + Sync {
    /// Duration in seconds, or `0.0` if it cannot be determined.
    async fn probe(&self, path: &Path) -> f64;

    /// Concatenate `spec.inputs` in order into `spec.output`.
    async fn concat(&self, spec: &ConcatSpec) -> MediaResult<()>;

    /// Apply a transform.
    async fn transform(&self, spec: &TransformSpec) -> MediaResult<()>;
}

/// [`MediaToolchain`] backed by the `ffmpeg` / `ffprobe` binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegToolchain {
    runner: FfmpegRunner,
}

impl FfmpegToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-command timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl MediaToolchain for FfmpegToolchain {
    async fn probe(&self, path: &Path) -> f64 {
        match probe_duration(path).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!(path = %path.display(), "Duration probe failed, assuming 0s: {}", e);
                0.0
            }
        }
    }

    async fn concat(&self, spec: &ConcatSpec) -> MediaResult<()> {
        if let Some(parent) = spec.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&spec.list_file, concat_list(&spec.inputs)?).await?;

        let cmd = FfmpegCommand::new(&spec.list_file, &spec.output)
            .input_args(["-f", "concat", "-safe", "0"]);
        let cmd = match spec.codec {
            ConcatCodec::Copy => cmd.stream_copy(),
            ConcatCodec::Mp3 => cmd.audio_codec("libmp3lame").output_args(["-q:a", "2"]),
        };

        self.runner.run("concat", &cmd).await
    }

    async fn transform(&self, spec: &TransformSpec) -> MediaResult<()> {
        if let Some(parent) = spec.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let cmd = build_transform(spec)?;
        self.runner.run(spec.transform.name(), &cmd).await
    }
}

/// Concat-demuxer list body with absolute, quoted paths.
fn concat_list(inputs: &[PathBuf]) -> MediaResult<String> {
    let mut body = String::new();
    for input in inputs {
        let absolute = if input.is_absolute() {
            input.clone()
        } else {
            std::env::current_dir()?.join(input)
        };
        let escaped = absolute.to_string_lossy().replace('\'', "'\\''");
        body.push_str(&format!("file '{}'\n", escaped));
    }
    Ok(body)
}

/// Translate a transform into an FFmpeg invocation.
pub(crate) fn build_transform(spec: &TransformSpec) -> MediaResult<FfmpegCommand> {
    let input = spec
        .inputs
        .first()
        .ok_or_else(|| MediaError::internal("transform requires at least one input"))?;

    let cmd = match &spec.transform {
        Transform::StreamLoop { loops, duration } => FfmpegCommand::new(input, &spec.output)
            .input_args(["-stream_loop".to_string(), loops.saturating_sub(1).to_string()])
            .duration(*duration)
            .stream_copy(),
        Transform::MuxShortest => {
            let audio = spec
                .inputs
                .get(1)
                .ok_or_else(|| MediaError::internal("mux requires a video and an audio input"))?;
            FfmpegCommand::new(input, &spec.output)
                .input(audio)
                .video_codec("copy")
                .audio_codec("aac")
                .output_arg("-shortest")
        }
        Transform::ExtractFrame { at_secs } => FfmpegCommand::new(input, &spec.output)
            .input_args(["-ss".to_string(), format_seek(*at_secs)])
            .single_frame(),
        Transform::VerticalShort { subtitles } => FfmpegCommand::new(input, &spec.output)
            .video_filter(vertical_filter(subtitles.as_deref()))
            .video_codec("libx264")
            .crf(23)
            .audio_codec("copy"),
        Transform::KenBurns {
            duration,
            fps,
            zoom_in,
        } => FfmpegCommand::new(input, &spec.output)
            .input_args(["-loop", "1"])
            .video_filter(ken_burns_filter(*duration, *fps, *zoom_in))
            .video_codec("libx264")
            .duration(*duration)
            .output_args(["-pix_fmt".to_string(), "yuv420p".to_string()])
            .output_args(["-r".to_string(), fps.to_string()]),
    };

    Ok(cmd)
}

/// `HH:MM:SS` seek position.
fn format_seek(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Escape a path for use inside the `subtitles=` filter argument.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}

fn vertical_filter(subtitles: Option<&Path>) -> String {
    let mut filter = "scale=-1:1920,crop=1080:1920,setsar=1".to_string();
    if let Some(srt) = subtitles {
        filter.push_str(&format!(
            ",subtitles='{}':force_style='Alignment=2,FontSize=24,Outline=1,BorderStyle=3,PrimaryColour=&H00FFFFFF'",
            escape_filter_path(srt)
        ));
    }
    filter
}

fn ken_burns_filter(duration: f64, fps: u32, zoom_in: bool) -> String {
    let frames = (duration * fps as f64).round().max(1.0) as u64;
    let zoom = if zoom_in {
        "min(zoom+0.0015,1.5)"
    } else {
        "max(1.5-0.0015*on,1.0)"
    };
    format!(
        "scale=3840:-1,zoompan=z='{}':d={}:x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s=1280x720,setsar=1",
        zoom, frames
    )
}
