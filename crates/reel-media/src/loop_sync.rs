//! Loop-to-audio sync: repeat a generated clip until it covers the scene
//! narration, then trim to the narration length.

use std::path::Path;
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::toolchain::{MediaToolchain, Transform, TransformSpec};

/// Number of clip repetitions needed to cover `audio_secs`.
///
/// Fails with [`MediaError::ZeroDuration`] if either duration is zero or
/// not a finite positive number.
pub fn loop_count(clip_secs: f64, audio_secs: f64) -> MediaResult<u32> {
    let valid = |d: f64| d.is_finite() && d > 0.0;
    if !valid(clip_secs) || !valid(audio_secs) {
        return Err(MediaError::ZeroDuration {
            clip_secs,
            audio_secs,
        });
    }
    Ok((audio_secs / clip_secs).ceil().max(1.0) as u32)
}

/// Loop `video` to the probed duration of `audio`, writing `output`.
///
/// Returns the target (audio) duration in seconds.
pub async fn loop_to_audio(
    toolchain: &dyn MediaToolchain,
    video: &Path,
    audio: &Path,
    output: &Path,
) -> MediaResult<f64> {
    let clip_secs = toolchain.probe(video).await;
    let audio_secs = toolchain.probe(audio).await;
    let loops = loop_count(clip_secs, audio_secs)?;

    debug!(clip_secs, audio_secs, loops, "Looping clip to narration");

    let spec = TransformSpec::new(
        video,
        output,
        Transform::StreamLoop {
            loops,
            duration: audio_secs,
        },
    );
    toolchain.transform(&spec).await?;

    Ok(audio_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ConcatSpec;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Files hold their duration as text; `StreamLoop` writes the trimmed length.
    #[derive(Default)]
    struct TextDurations {
        loops_seen: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl MediaToolchain for TextDurations {
        async fn probe(&self, path: &Path) -> f64 {
            tokio::fs::read_to_string(path)
                .await
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0.0)
        }

        async fn concat(&self, _spec: &ConcatSpec) -> MediaResult<()> {
            unreachable!()
        }

        async fn transform(&self, spec: &TransformSpec) -> MediaResult<()> {
            let Transform::StreamLoop { loops, duration } = spec.transform else {
                unreachable!()
            };
            self.loops_seen.lock().unwrap().push(loops);
            tokio::fs::write(&spec.output, duration.to_string()).await?;
            Ok(())
        }
    }

    #[test]
    fn test_loop_count() {
        assert_eq!(loop_count(4.0, 10.0).unwrap(), 3);
        assert_eq!(loop_count(5.0, 5.0).unwrap(), 1);
        assert_eq!(loop_count(10.0, 4.0).unwrap(), 1);
    }

    #[test]
    fn test_loop_count_rejects_zero() {
        assert!(matches!(loop_count(0.0, 10.0), Err(MediaError::ZeroDuration { .. })));
        assert!(matches!(loop_count(4.0, 0.0), Err(MediaError::ZeroDuration { .. })));
        assert!(loop_count(f64::NAN, 3.0).is_err());
    }

    #[tokio::test]
    async fn test_loop_to_audio_matches_audio_duration() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        let audio = dir.path().join("narration.mp3");
        let output = dir.path().join("looped.mp4");
        tokio::fs::write(&video, "4").await.unwrap();
        tokio::fs::write(&audio, "10").await.unwrap();

        let toolchain = TextDurations::default();
        let duration = loop_to_audio(&toolchain, &video, &audio, &output).await.unwrap();

        assert_eq!(duration, 10.0);
        assert_eq!(*toolchain.loops_seen.lock().unwrap(), vec![3]);
        assert_eq!(toolchain.probe(&output).await, 10.0);
    }

    #[tokio::test]
    async fn test_unprobeable_audio_fails() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        tokio::fs::write(&video, "4").await.unwrap();

        let err = loop_to_audio(
            &TextDurations::default(),
            &video,
            &dir.path().join("missing.mp3"),
            &dir.path().join("out.mp4"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::ZeroDuration { audio_secs, .. } if audio_secs == 0.0));
    }
}
