//! SRT subtitle synthesis.
//!
//! Per-scene cues are spread uniformly over the scene's narration audio.
//! The master track shifts each scene's cues by the summed *audio*
//! durations of the scenes before it.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use reel_models::SubtitleCue;

use crate::error::{MediaError, MediaResult};
use crate::toolchain::MediaToolchain;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid regex"));

/// Split narration into sentence-like units on terminal punctuation.
///
/// Text without any match is returned as a single unit.
pub fn split_sentences(text: &str) -> Vec<String> {
    let sentences: Vec<String> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        vec![text.trim().to_string()]
    } else {
        sentences
    }
}

/// Clamp to a finite, non-negative number of seconds.
fn clamp_secs(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (clamp_secs(secs) * 1000.0).round() as u64
}

/// Format seconds as `HH:MM:SS,mmm`. Non-finite or negative input formats as zero.
pub fn format_srt_time(secs: f64) -> String {
    format_ms(secs_to_ms(secs))
}

fn format_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

fn parse_timestamp(s: &str) -> MediaResult<u64> {
    let invalid = || MediaError::invalid_subtitle(format!("bad timestamp '{}'", s));

    let (hms, millis) = s.trim().split_once(',').ok_or_else(invalid)?;
    let mut parts = hms.split(':');
    let mut next = || -> MediaResult<u64> {
        parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)
    };
    let (hours, minutes, seconds) = (next()?, next()?, next()?);
    let millis: u64 = millis.parse().map_err(|_| invalid())?;

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Build cues for `text` spread uniformly across `duration_secs`.
///
/// Cue `i` spans `[i * D/N, (i+1) * D/N)`; the last cue ends exactly at `D`.
pub fn build_cues(text: &str, duration_secs: f64) -> Vec<SubtitleCue> {
    let duration = clamp_secs(duration_secs);
    let sentences = split_sentences(text);
    let count = sentences.len();
    let per_sentence = duration / count as f64;

    sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| {
            let end_ms = if i + 1 == count {
                secs_to_ms(duration)
            } else {
                secs_to_ms((i + 1) as f64 * per_sentence)
            };
            SubtitleCue {
                index: i as u32 + 1,
                start_ms: secs_to_ms(i as f64 * per_sentence),
                end_ms,
                text: sentence,
            }
        })
        .collect()
}

/// Serialize cues as an SRT document.
pub fn render_srt(cues: &[SubtitleCue]) -> String {
    cues.iter()
        .map(|cue| {
            format!(
                "{}\n{} --> {}\n{}\n\n",
                cue.index,
                format_ms(cue.start_ms),
                format_ms(cue.end_ms),
                cue.text
            )
        })
        .collect()
}

/// Parse an SRT document.
pub fn parse_srt(content: &str) -> MediaResult<Vec<SubtitleCue>> {
    let normalized = content.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().filter(|l| !l.trim().is_empty());
        let Some(index_line) = lines.next() else {
            continue;
        };
        let index: u32 = index_line
            .trim()
            .trim_start_matches('\u{feff}')
            .parse()
            .map_err(|_| MediaError::invalid_subtitle(format!("bad cue index '{}'", index_line)))?;

        let timing = lines
            .next()
            .ok_or_else(|| MediaError::invalid_subtitle(format!("cue {} has no timing", index)))?;
        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| MediaError::invalid_subtitle(format!("bad timing line '{}'", timing)))?;

        cues.push(SubtitleCue {
            index,
            start_ms: parse_timestamp(start)?,
            end_ms: parse_timestamp(end)?,
            text: lines.collect::<Vec<_>>().join("\n"),
        });
    }

    Ok(cues)
}

/// Write the SRT file for one scene's narration.
pub async fn create_srt_file(
    text: &str,
    duration_secs: f64,
    path: impl AsRef<Path>,
) -> MediaResult<Vec<SubtitleCue>> {
    let path = path.as_ref();
    let cues = build_cues(text, duration_secs);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, render_srt(&cues)).await?;

    debug!(path = %path.display(), cues = cues.len(), "Wrote scene subtitles");
    Ok(cues)
}

/// Per-scene inputs to the master track.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    /// Scene SRT file
    pub subtitles: PathBuf,
    /// Scene narration audio; its probed duration advances the offset
    pub audio: PathBuf,
}

/// Merge per-scene SRT files into one master track.
///
/// A scene without a subtitle file contributes no cues, but its audio
/// duration still advances the offset. Cues are renumbered from 1.
/// Returns the number of cues written.
pub async fn merge_srt_files(
    tracks: &[SubtitleTrack],
    output: impl AsRef<Path>,
    toolchain: &dyn MediaToolchain,
) -> MediaResult<usize> {
    let output = output.as_ref();
    let mut merged: Vec<SubtitleCue> = Vec::new();
    let mut offset_ms: u64 = 0;

    for (scene, track) in tracks.iter().enumerate() {
        if tokio::fs::try_exists(&track.subtitles).await? {
            let content = tokio::fs::read_to_string(&track.subtitles).await?;
            merged.extend(parse_srt(&content)?.iter().map(|cue| cue.shifted(offset_ms)));
        } else {
            warn!(scene, path = %track.subtitles.display(), "Scene subtitles missing, skipping");
        }

        if tokio::fs::try_exists(&track.audio).await? {
            offset_ms += secs_to_ms(toolchain.probe(&track.audio).await);
        }
    }

    for (i, cue) in merged.iter_mut().enumerate() {
        cue.index = i as u32 + 1;
    }

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, render_srt(&merged)).await?;

    Ok(merged.len())
}
