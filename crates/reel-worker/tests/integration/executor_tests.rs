//! Job executor: queueing, watchdog and shutdown.

use std::sync::Arc;
use std::time::Duration;

use reel_models::{JobId, RenderMode, RenderRequest, RenderStatus};
use reel_queue::ProgressEvent;
use reel_worker::{JobExecutor, WorkerError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::support::{script, FakeSpeech, Harness, HarnessOptions};

fn start(harness: &Harness) -> (Arc<JobExecutor>, JoinHandle<Result<(), WorkerError>>) {
    let executor = Arc::new(JobExecutor::new(harness.config.clone(), harness.pipeline.clone()));
    let runner = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move { executor.run().await })
    };
    (executor, runner)
}

async fn wait_status(
    rx: &mut broadcast::Receiver<ProgressEvent>,
    job_id: &JobId,
    status: RenderStatus,
) -> ProgressEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = rx.recv().await.expect("progress channel open");
            if &event.job_id == job_id && event.update.status == status {
                return event;
            }
        }
    })
    .await
    .expect("job reached the expected status")
}

/// One worker slot, held by a job whose narration never finishes.
fn single_stalled_worker() -> Harness {
    Harness::with(HarnessOptions {
        speech: FakeSpeech {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        },
        max_concurrent_jobs: Some(1),
        shutdown_timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    })
}

async fn wait_terminal(rx: &mut broadcast::Receiver<ProgressEvent>, job_id: &JobId) -> ProgressEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = rx.recv().await.expect("progress channel open");
            if &event.job_id == job_id && event.update.status.is_terminal() {
                return event;
            }
        }
    })
    .await
    .expect("job reached a terminal status")
}

#[tokio::test]
async fn test_submitted_job_runs_to_completion() {
    let harness = Harness::new();
    let mut rx = harness.progress.subscribe();
    let (executor, runner) = start(&harness);

    let job_id = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap();
    let event = wait_terminal(&mut rx, &job_id).await;

    assert_eq!(event.update.status, RenderStatus::Complete);
    let job = executor.status(&job_id).await.unwrap();
    assert_eq!(job.status, RenderStatus::Complete);
    assert_eq!(job.scenes.len(), 1);

    executor.shutdown();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_submitted_job_is_queued_while_workers_are_busy() {
    let harness = single_stalled_worker();
    let mut rx = harness.progress.subscribe();
    let (executor, runner) = start(&harness);

    let first = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap();
    wait_status(&mut rx, &first, RenderStatus::Rendering).await;

    let second = executor
        .submit(RenderRequest::new(script(140)).with_mode(RenderMode::Audio))
        .await
        .unwrap();
    let job = executor.status(&second).await.expect("accepted job is pollable");
    assert_eq!(job.status, RenderStatus::Queued);
    assert_eq!(job.scenes.len(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        executor.status(&second).await.unwrap().status,
        RenderStatus::Queued
    );

    executor.shutdown();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_is_not_blocked_by_busy_workers() {
    let harness = single_stalled_worker();
    let mut rx = harness.progress.subscribe();
    let (executor, runner) = start(&harness);

    let first = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap();
    wait_status(&mut rx, &first, RenderStatus::Rendering).await;
    let second = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap();

    executor.shutdown();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("executor stopped while its only worker was busy")
        .unwrap()
        .unwrap();

    // The queued job never started, so it is failed rather than abandoned.
    let job = harness.snapshot(&second).await;
    assert_eq!(job.status, RenderStatus::Failed);
    assert!(job.error_message.unwrap().contains("shut down"));
    assert!(harness.layout.error_log(&second).exists());
    assert_eq!(harness.snapshot(&first).await.status, RenderStatus::Rendering);
}

#[tokio::test]
async fn test_submit_after_shutdown_fails_the_job() {
    let harness = Harness::new();
    let mut rx = harness.progress.subscribe();
    let (executor, runner) = start(&harness);

    executor.shutdown();
    runner.await.unwrap().unwrap();

    let err = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Queue(_)));

    let failed = super::support::drain(&mut rx)
        .into_iter()
        .find(|event| event.update.status == RenderStatus::Failed)
        .expect("failure was published");
    assert_eq!(
        harness.snapshot(&failed.job_id).await.status,
        RenderStatus::Failed
    );
}

#[tokio::test]
async fn test_invalid_request_is_rejected_at_submit() {
    let harness = Harness::new();
    let (executor, runner) = start(&harness);

    let err = executor.submit(RenderRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, WorkerError::Validation(_)));

    let err = executor
        .submit(RenderRequest::new(script(10)).with_plan_limit(-1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Validation(_)));

    executor.shutdown();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_job_has_no_status() {
    let harness = Harness::new();
    let executor = JobExecutor::new(harness.config.clone(), harness.pipeline.clone());

    assert!(executor.status(&JobId::from_string("missing")).await.is_none());
}

#[tokio::test]
async fn test_watchdog_marks_stalled_job_failed() {
    let harness = Harness::with(HarnessOptions {
        speech: FakeSpeech {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        },
        job_timeout: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let mut rx = harness.progress.subscribe();
    let (executor, runner) = start(&harness);

    let job_id = executor
        .submit(RenderRequest::new(script(70)).with_mode(RenderMode::Audio))
        .await
        .unwrap();
    let event = wait_terminal(&mut rx, &job_id).await;

    assert_eq!(event.update.status, RenderStatus::Failed);
    assert!(event.update.message.unwrap().contains("timed out"));

    let job = harness.snapshot(&job_id).await;
    assert_eq!(job.status, RenderStatus::Failed);
    assert!(harness.layout.error_log(&job_id).exists());

    executor.shutdown();
    runner.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_twice_is_rejected() {
    let harness = Harness::new();
    let (executor, runner) = start(&harness);

    // Let the first run claim the queue.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let err = executor.run().await.unwrap_err();
    assert!(matches!(err, WorkerError::ConfigError(_)));

    executor.shutdown();
    runner.await.unwrap().unwrap();
}
