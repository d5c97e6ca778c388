//! Job executor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use reel_models::{JobId, JobUpdate, ProgressUpdate, RenderJob, RenderRequest, Scene};
use reel_queue::{QueueError, RenderVideoJob};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::pipeline::{write_error_log, RenderPipeline};

/// Pending jobs buffered ahead of the workers.
const QUEUE_CAPACITY: usize = 64;

/// A job admitted by `submit`, waiting for a worker.
struct QueuedJob {
    job: RenderVideoJob,
    scenes: Vec<Scene>,
}

/// Accepts render requests and runs them with bounded concurrency.
///
/// Every job runs under a watchdog: on expiry or panic the job is marked
/// `failed` and a progress event is emitted. Jobs still queued at shutdown
/// are marked `failed` too, so no accepted job is left non-terminal.
pub struct JobExecutor {
    config: WorkerConfig,
    pipeline: Arc<RenderPipeline>,
    job_semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    sender: mpsc::Sender<QueuedJob>,
    receiver: Mutex<Option<mpsc::Receiver<QueuedJob>>>,
    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, pipeline: Arc<RenderPipeline>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            config,
            pipeline,
            job_semaphore,
            in_flight: Arc::new(AtomicUsize::new(0)),
            sender,
            receiver: Mutex::new(Some(receiver)),
            shutdown,
            shutdown_rx,
        }
    }

    /// Validate, plan and enqueue a render request, returning its job id.
    ///
    /// The job is visible to [`JobExecutor::status`] as `queued` as soon as
    /// this returns.
    pub async fn submit(&self, request: RenderRequest) -> WorkerResult<JobId> {
        request.validate()?;

        let job = RenderVideoJob::new(request);
        let job_id = job.job_id.clone();
        let mode = job.request.mode;
        let scenes = self.pipeline.admit(&job).await?;

        if self.sender.send(QueuedJob { job, scenes }).await.is_err() {
            Self::mark_failed(
                &self.pipeline,
                &job_id,
                WorkerError::job_failed("executor shut down before the job started"),
            )
            .await;
            return Err(QueueError::enqueue_failed("executor is not accepting jobs").into());
        }

        metrics::record_job_submitted(mode);
        info!(job_id = %job_id, "Render job enqueued");
        Ok(job_id)
    }

    /// Current snapshot of a job, `None` when unknown.
    pub async fn status(&self, job_id: &JobId) -> Option<RenderJob> {
        self.pipeline.store().get(job_id).await
    }

    /// Consume queued jobs until shutdown, then wait for in-flight jobs.
    pub async fn run(&self) -> WorkerResult<()> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| WorkerError::config_error("executor is already running"))?;

        info!(
            "Starting job executor with {} max concurrent jobs",
            self.config.max_concurrent_jobs
        );

        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            self.evict_finished().await;

            let permit = tokio::select! {
                _ = stop_requested(&mut shutdown_rx) => break,
                permit = self.job_semaphore.clone().acquire_owned() => {
                    permit.map_err(|_| WorkerError::job_failed("Semaphore closed"))?
                }
            };

            let queued = tokio::select! {
                _ = stop_requested(&mut shutdown_rx) => break,
                queued = receiver.recv() => match queued {
                    Some(queued) => queued,
                    None => {
                        debug!("Job channel closed");
                        break;
                    }
                },
            };

            let pipeline = Arc::clone(&self.pipeline);
            let in_flight = Arc::clone(&self.in_flight);
            let timeout = self.config.job_timeout;

            tokio::spawn(async move {
                let _permit = permit;
                metrics::set_jobs_in_flight(in_flight.fetch_add(1, Ordering::SeqCst) + 1);
                Self::execute_job(pipeline, queued, timeout).await;
                metrics::set_jobs_in_flight(in_flight.fetch_sub(1, Ordering::SeqCst) - 1);
            });
        }

        info!("Shutdown signal received, stopping executor");
        receiver.close();
        while let Some(queued) = receiver.recv().await {
            Self::mark_failed(
                &self.pipeline,
                &queued.job.job_id,
                WorkerError::job_failed("executor shut down before the job started"),
            )
            .await;
        }

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "{} jobs still running after {:?}",
                self.in_flight.load(Ordering::SeqCst),
                self.config.shutdown_timeout
            );
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Run one job under the watchdog.
    async fn execute_job(pipeline: Arc<RenderPipeline>, queued: QueuedJob, timeout: Duration) {
        let QueuedJob { job, scenes } = queued;
        let job_id = job.job_id.clone();
        info!("Executing job {}", job_id);

        let task_pipeline = Arc::clone(&pipeline);
        let handle = tokio::spawn(async move { task_pipeline.run_admitted(&job, scenes).await });
        let abort = handle.abort_handle();

        match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(outcome))) => {
                info!(
                    "Job {} completed successfully ({} assets, {} warnings)",
                    job_id,
                    outcome.assets.len(),
                    outcome.warnings.len()
                );
            }
            Ok(Ok(Err(e))) => {
                // The pipeline has already recorded its own failure.
                error!("Job {} failed: {}", job_id, e);
            }
            Ok(Err(join_error)) => {
                let reason = if join_error.is_panic() {
                    "render pipeline panicked"
                } else {
                    "render pipeline was cancelled"
                };
                Self::mark_failed(&pipeline, &job_id, WorkerError::job_failed(reason)).await;
            }
            Err(_) => {
                abort.abort();
                Self::mark_failed(&pipeline, &job_id, WorkerError::Timeout(timeout.as_secs())).await;
            }
        }
    }

    /// Executor-level failure: job -> `failed`.
    async fn mark_failed(pipeline: &RenderPipeline, job_id: &JobId, error: WorkerError) {
        let message = error.to_string();
        let status = error.terminal_status();
        error!("Job {} {}: {}", job_id, status, message);
        metrics::record_job_failed(status);

        write_error_log(pipeline.layout(), job_id, &error).await;
        pipeline
            .store()
            .update(job_id, JobUpdate::failure(status, &message))
            .await;
        pipeline
            .progress()
            .emit(job_id, ProgressUpdate::status(status).with_message(message))
            .await;
    }

    /// Drop terminal jobs past the retention window.
    async fn evict_finished(&self) {
        let evicted = self
            .pipeline
            .store()
            .evict_terminal(self.config.job_retention)
            .await;
        if evicted > 0 {
            debug!("Evicted {} finished jobs", evicted);
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            let available = self.job_semaphore.available_permits();
            if available == self.config.max_concurrent_jobs.max(1) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown. Safe to call before [`JobExecutor::run`] starts.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
