//! Local media toolchain for the Reel render pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with timeouts
//! - Duration probing via FFprobe
//! - The [`MediaToolchain`] seam (`probe` / `concat` / `transform`)
//! - SRT subtitle synthesis and master-track merging
//! - Loop-to-audio sync for generated clips
//! - Final assembly: concat, mux, thumbnail and vertical short

pub mod assembler;
pub mod command;
pub mod error;
pub mod loop_sync;
pub mod probe;
pub mod subtitle;
pub mod toolchain;

pub use assembler::{AssembledOutput, MediaAssembler};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use loop_sync::{loop_count, loop_to_audio};
pub use probe::probe_duration;
pub use subtitle::{
    build_cues, create_srt_file, format_srt_time, merge_srt_files, parse_srt, render_srt,
    SubtitleTrack,
};
pub use toolchain::{ConcatCodec, ConcatSpec, FfmpegToolchain, MediaToolchain, Transform, TransformSpec};
