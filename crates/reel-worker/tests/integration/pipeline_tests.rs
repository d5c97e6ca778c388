//! End-to-end runs of the render pipeline.

use std::sync::atomic::Ordering;

use reel_models::{RenderMode, RenderRequest, RenderStatus, SceneStatus};
use reel_queue::RenderVideoJob;
use reel_worker::WorkerError;

use super::support::{
    drain, script, status_sequence, FakeSpeech, FakeVideo, Harness, HarnessOptions, NARRATION_SECS,
};

fn job(mode: RenderMode, limit: f64) -> RenderVideoJob {
    RenderVideoJob::new(
        RenderRequest::new(script(140))
            .with_mode(mode)
            .with_plan_limit(limit),
    )
}

#[tokio::test]
async fn test_full_render_produces_every_artifact() {
    let harness = Harness::new();
    let mut rx = harness.progress.subscribe();
    let job = job(RenderMode::Full, 100.0);
    let job_id = &job.job_id;

    let outcome = harness.pipeline.run(&job).await.unwrap();

    assert_eq!(outcome.scenes.len(), 2);
    assert!(outcome.warnings.is_empty());
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.images.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.videos.calls.load(Ordering::SeqCst), 2);

    let artifacts = outcome.artifacts.expect("full mode assembles");
    let layout = &harness.layout;
    assert_eq!(artifacts.video, layout.final_video(job_id));
    assert_eq!(artifacts.duration, 2.0 * NARRATION_SECS);
    for path in [
        layout.final_video(job_id),
        layout.final_audio(job_id),
        layout.final_subtitles(job_id),
        layout.thumbnail(job_id),
        layout.short(job_id),
        layout.description(job_id),
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }
    assert!(!layout.stitched_video(job_id).exists());

    let description = std::fs::read_to_string(layout.description(job_id)).unwrap();
    assert!(description.contains("Chapters:"));
    assert!(description.starts_with("🎬"));

    let snapshot = harness.snapshot(job_id).await;
    assert_eq!(snapshot.status, RenderStatus::Complete);
    assert_eq!(snapshot.completed_scenes(), 2);
    assert!(snapshot.scenes.iter().all(|s| s.thumbnail.is_some()));

    let events = drain(&mut rx);
    assert_eq!(
        status_sequence(&events),
        vec![
            RenderStatus::Queued,
            RenderStatus::Rendering,
            RenderStatus::Assembling,
            RenderStatus::Complete,
        ]
    );
    let scenes: Vec<_> = events
        .iter()
        .filter_map(|e| e.update.scene.zip(e.update.total_scenes))
        .collect();
    assert_eq!(scenes, vec![(1, 2), (2, 2)]);
}

#[tokio::test]
async fn test_cost_gate_rejects_before_any_generation() {
    let harness = Harness::new();
    let mut rx = harness.progress.subscribe();
    let job = job(RenderMode::Full, 0.0);

    let err = harness.pipeline.run(&job).await.unwrap_err();

    assert!(matches!(err, WorkerError::CostExceeded { limit_usd, .. } if limit_usd == 0.0));
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.images.calls.load(Ordering::SeqCst), 0);

    let snapshot = harness.snapshot(&job.job_id).await;
    assert_eq!(snapshot.status, RenderStatus::Error);
    assert!(snapshot.error_message.unwrap().contains("Cost limit exceeded"));
    assert!(harness.layout.error_log(&job.job_id).exists());

    let last = drain(&mut rx).pop().unwrap();
    assert_eq!(last.update.status, RenderStatus::Error);
    assert!(last.update.message.is_some());
}

#[tokio::test]
async fn test_scene_failure_stops_the_job() {
    let harness = Harness::with(HarnessOptions {
        video: FakeVideo {
            always_fail: true,
            ..Default::default()
        },
        ..Default::default()
    });
    let job = job(RenderMode::Video, 100.0);

    let err = harness.pipeline.run(&job).await.unwrap_err();

    assert!(matches!(err, WorkerError::ProviderExhausted { ref modality, .. } if modality == "video"));
    // One retry around a single-provider chain, first scene only.
    assert_eq!(harness.videos.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 1);

    let snapshot = harness.snapshot(&job.job_id).await;
    assert_eq!(snapshot.status, RenderStatus::Error);
    assert_eq!(snapshot.scenes[0].status, SceneStatus::Failed);
    assert_eq!(snapshot.scenes[1].status, SceneStatus::Pending);

    let log = std::fs::read_to_string(harness.layout.error_log(&job.job_id)).unwrap();
    assert!(log.contains("moderation rejected prompt"));
    assert!(!harness.layout.final_video(&job.job_id).exists());
}

#[tokio::test]
async fn test_transient_speech_failure_is_retried() {
    let harness = Harness::with(HarnessOptions {
        speech: FakeSpeech {
            failures: 1,
            ..Default::default()
        },
        ..Default::default()
    });
    let job = job(RenderMode::Audio, 100.0);

    let outcome = harness.pipeline.run(&job).await.unwrap();

    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.assets.len(), 2);
}

#[tokio::test]
async fn test_short_failure_is_a_warning() {
    let harness = Harness::with(HarnessOptions {
        fail_vertical_short: true,
        ..Default::default()
    });
    let job = job(RenderMode::Full, 100.0);

    let outcome = harness.pipeline.run(&job).await.unwrap();

    let artifacts = outcome.artifacts.unwrap();
    assert!(artifacts.short.is_none());
    assert!(artifacts.description.is_some());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("Vertical short failed"));

    let snapshot = harness.snapshot(&job.job_id).await;
    assert_eq!(snapshot.status, RenderStatus::Complete);
    assert_eq!(snapshot.warnings, outcome.warnings);
}

#[tokio::test]
async fn test_audio_mode_skips_assembly() {
    let harness = Harness::new();
    let mut rx = harness.progress.subscribe();
    let job = job(RenderMode::Audio, 100.0);
    let job_id = &job.job_id;

    let outcome = harness.pipeline.run(&job).await.unwrap();

    assert!(outcome.artifacts.is_none());
    assert_eq!(harness.images.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.videos.calls.load(Ordering::SeqCst), 0);
    assert!(harness.layout.scene_subtitles(job_id, 0).exists());
    assert!(harness.layout.scene_subtitles(job_id, 1).exists());
    assert!(!harness.layout.final_video(job_id).exists());

    let statuses = status_sequence(&drain(&mut rx));
    assert!(!statuses.contains(&RenderStatus::Assembling));
    assert_eq!(statuses.last(), Some(&RenderStatus::Complete));
}

#[tokio::test]
async fn test_image_mode_marks_scene_thumbnails() {
    let harness = Harness::new();
    let job = job(RenderMode::Image, 100.0);

    harness.pipeline.run(&job).await.unwrap();

    assert_eq!(harness.speech.calls.load(Ordering::SeqCst), 0);
    let snapshot = harness.snapshot(&job.job_id).await;
    assert_eq!(snapshot.status, RenderStatus::Complete);
    assert_eq!(
        snapshot.scenes[1].thumbnail.as_deref(),
        Some(harness.layout.scene_image(&job.job_id, 1).display().to_string().as_str())
    );
}
