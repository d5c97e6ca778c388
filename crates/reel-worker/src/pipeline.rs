//! Render pipeline orchestration.
//!
//! Plan, gate on cost, run scenes strictly in order, then assemble. The
//! pipeline alone decides the job's terminal status; every stage returns
//! an explicit result.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{warn, Instrument};

use reel_media::{MediaAssembler, MediaToolchain};
use reel_models::{
    ArtifactLayout, CostEstimate, GeneratedAsset, JobId, JobUpdate, ProgressUpdate, RenderStatus,
    Scene, SceneStatus, SceneUpdate,
};
use reel_providers::ProviderRegistry;
use reel_queue::{ProgressEmitter, RenderVideoJob};

use crate::config::WorkerConfig;
use crate::cost::CostGuard;
use crate::description::write_description;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::planner::ScenePlanner;
use crate::scene_executor::SceneExecutor;
use crate::state::RenderStore;

/// Final artifacts of an assembled job.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledArtifacts {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub subtitles: PathBuf,
    pub thumbnail: PathBuf,
    /// Probed duration of the final video
    pub duration: f64,
    pub short: Option<PathBuf>,
    pub description: Option<PathBuf>,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub job_id: JobId,
    pub scenes: Vec<Scene>,
    pub estimate: CostEstimate,
    /// Per-scene assets in scene order
    pub assets: Vec<GeneratedAsset>,
    /// Present when the mode assembles a final video
    pub artifacts: Option<AssembledArtifacts>,
    /// Non-fatal stage failures
    pub warnings: Vec<String>,
}

/// One render job, end to end.
pub struct RenderPipeline {
    store: Arc<dyn RenderStore>,
    progress: Arc<dyn ProgressEmitter>,
    planner: ScenePlanner,
    cost: CostGuard,
    scenes: SceneExecutor,
    assembler: MediaAssembler,
    default_limit_usd: f64,
}

impl RenderPipeline {
    pub fn new(
        config: &WorkerConfig,
        store: Arc<dyn RenderStore>,
        progress: Arc<dyn ProgressEmitter>,
        toolchain: Arc<dyn MediaToolchain>,
        providers: ProviderRegistry,
    ) -> Self {
        let layout = ArtifactLayout::new(config.media_root.clone());
        Self {
            store,
            progress,
            planner: ScenePlanner::from_seed(config.planner_seed),
            cost: CostGuard::new(config.cost_per_minute_usd),
            scenes: SceneExecutor::new(providers, toolchain.clone(), layout.clone(), config.retry()),
            assembler: MediaAssembler::new(toolchain, layout),
            default_limit_usd: config.plan_limit_usd,
        }
    }

    pub fn store(&self) -> &Arc<dyn RenderStore> {
        &self.store
    }

    pub fn progress(&self) -> &Arc<dyn ProgressEmitter> {
        &self.progress
    }

    pub fn layout(&self) -> &ArtifactLayout {
        self.assembler.layout()
    }

    /// Run `job` to a terminal status.
    ///
    /// On failure the job is left in `error`, a diagnostic log is written
    /// and an `error` progress event is emitted before returning.
    pub async fn run(&self, job: &RenderVideoJob) -> WorkerResult<RenderOutcome> {
        let scenes = self.admit(job).await?;
        self.run_admitted(job, scenes).await
    }

    /// Plan `job` and register it as `queued`.
    ///
    /// After this returns the job is visible to pollers. Nothing is
    /// recorded for a request that fails validation.
    pub async fn admit(&self, job: &RenderVideoJob) -> WorkerResult<Vec<Scene>> {
        job.request.validate()?;

        let scenes = self.planner.plan(&job.request.script);
        if scenes.is_empty() {
            return Err(WorkerError::validation("Script has no words"));
        }

        self.store.init(&job.job_id, scenes.len()).await;
        self.progress
            .emit(&job.job_id, ProgressUpdate::status(RenderStatus::Queued))
            .await;
        Ok(scenes)
    }

    /// Run a job previously registered by [`RenderPipeline::admit`].
    pub async fn run_admitted(
        &self,
        job: &RenderVideoJob,
        scenes: Vec<Scene>,
    ) -> WorkerResult<RenderOutcome> {
        let logger = JobLogger::new(&job.job_id, "render");
        let span = logger.create_span();
        self.run_inner(job, scenes, &logger).instrument(span).await
    }

    async fn run_inner(
        &self,
        job: &RenderVideoJob,
        scenes: Vec<Scene>,
        logger: &JobLogger,
    ) -> WorkerResult<RenderOutcome> {
        let job_id = &job.job_id;
        let request = &job.request;
        let started = Instant::now();

        logger.log_start(&format!("mode={} style={}", request.mode, request.style.as_str()));

        let total = scenes.len() as u32;
        let estimate = self.cost.estimate(&scenes);

        let limit = request.plan_limit_usd.unwrap_or(self.default_limit_usd);
        if let Err(e) = self.cost.check(&estimate, limit) {
            metrics::record_cost_rejected();
            return Err(self.fail(job_id, logger, e).await);
        }
        logger.log_progress(&format!(
            "{} scenes, {:.2} min, ${:.2} of ${:.2}",
            total, estimate.total_minutes, estimate.estimated_usd, limit
        ));

        self.store
            .update(job_id, JobUpdate::status(RenderStatus::Rendering))
            .await;
        self.progress
            .emit(job_id, ProgressUpdate::status(RenderStatus::Rendering))
            .await;

        let mut assets = Vec::new();
        let mut first_subtitles: Option<PathBuf> = None;

        for scene in &scenes {
            self.store
                .update_scene(job_id, scene.id, SceneUpdate::status(SceneStatus::Rendering))
                .await;
            self.progress
                .emit(job_id, ProgressUpdate::scene(scene.id, total))
                .await;
            logger.log_scene(scene.id, total, "rendering");

            let scene_started = Instant::now();
            match self
                .scenes
                .execute(job_id, scene, request.style, request.mode)
                .await
            {
                Ok(output) => {
                    metrics::record_scene_duration(request.mode, scene_started.elapsed().as_secs_f64());
                    if scene.id == 0 {
                        first_subtitles = output.subtitles.clone();
                    }
                    self.store
                        .update_scene(job_id, scene.id, SceneUpdate::complete(output.thumbnail.clone()))
                        .await;
                    assets.extend(output.assets);
                }
                Err(e) => {
                    self.store
                        .update_scene(job_id, scene.id, SceneUpdate::status(SceneStatus::Failed))
                        .await;
                    logger.log_scene(scene.id, total, &format!("failed: {}", e));
                    return Err(self.fail(job_id, logger, e).await);
                }
            }
        }

        let mut warnings = Vec::new();
        let artifacts = if request.mode.assembles() {
            self.store
                .update(job_id, JobUpdate::status(RenderStatus::Assembling))
                .await;
            self.progress
                .emit(job_id, ProgressUpdate::status(RenderStatus::Assembling))
                .await;

            let assembled = self
                .assemble(
                    job_id,
                    &scenes,
                    request.mode.derives_extras(),
                    first_subtitles.as_deref(),
                    &mut warnings,
                    logger,
                )
                .await;
            match assembled {
                Ok(artifacts) => Some(artifacts),
                Err(e) => return Err(self.fail(job_id, logger, e).await),
            }
        } else {
            None
        };

        self.store
            .update(job_id, JobUpdate::status(RenderStatus::Complete))
            .await;
        self.progress
            .emit(job_id, ProgressUpdate::status(RenderStatus::Complete))
            .await;
        metrics::record_job_completed(request.mode, started.elapsed().as_secs_f64());
        logger.log_completion(&format!("{} scenes, {} warnings", total, warnings.len()));

        Ok(RenderOutcome {
            job_id: job_id.clone(),
            scenes,
            estimate,
            assets,
            artifacts,
            warnings,
        })
    }

    /// Master subtitles, concat + mux, thumbnail; then the optional extras.
    ///
    /// The first three are fatal. Short and description failures become
    /// job warnings.
    async fn assemble(
        &self,
        job_id: &JobId,
        scenes: &[Scene],
        extras: bool,
        short_subtitles: Option<&Path>,
        warnings: &mut Vec<String>,
        logger: &JobLogger,
    ) -> WorkerResult<AssembledArtifacts> {
        let count = scenes.len() as u32;

        let subtitles = self.assembler.merge_subtitles(job_id, count).await?;
        let output = self.assembler.assemble(job_id, count).await?;
        let thumbnail = self.assembler.thumbnail(job_id).await?;
        logger.log_progress("final video assembled");

        let mut artifacts = AssembledArtifacts {
            video: output.video,
            audio: output.audio,
            subtitles,
            thumbnail,
            duration: output.duration,
            short: None,
            description: None,
        };
        if !extras {
            return Ok(artifacts);
        }

        match self.assembler.vertical_short(job_id, short_subtitles).await {
            Ok(path) => artifacts.short = Some(path),
            Err(e) => {
                self.warn(job_id, logger, "short", format!("Vertical short failed: {}", e), warnings)
                    .await
            }
        }

        let description = self.layout().description(job_id);
        match write_description(scenes, &description).await {
            Ok(()) => artifacts.description = Some(description),
            Err(e) => {
                self.warn(job_id, logger, "description", format!("Description failed: {}", e), warnings)
                    .await
            }
        }

        Ok(artifacts)
    }

    /// Surface a non-fatal stage failure on the job, the progress channel and the log.
    async fn warn(
        &self,
        job_id: &JobId,
        logger: &JobLogger,
        stage: &'static str,
        message: String,
        warnings: &mut Vec<String>,
    ) {
        logger.log_warning(&message);
        metrics::record_stage_warning(stage);
        self.store.update(job_id, JobUpdate::warning(&message)).await;
        self.progress
            .emit(
                job_id,
                ProgressUpdate::status(RenderStatus::Assembling).with_message(&message),
            )
            .await;
        warnings.push(message);
    }

    /// Mark the job terminal, persist a diagnostic log and emit progress.
    async fn fail(&self, job_id: &JobId, logger: &JobLogger, error: WorkerError) -> WorkerError {
        let message = error.to_string();
        let status = error.terminal_status();
        logger.log_error(&message);
        metrics::record_job_failed(status);

        write_error_log(self.layout(), job_id, &error).await;
        self.store
            .update(job_id, JobUpdate::failure(status, &message))
            .await;
        self.progress
            .emit(job_id, ProgressUpdate::status(status).with_message(message))
            .await;

        error
    }
}

/// Write the job's diagnostic log. Failure to write is logged, not returned.
pub async fn write_error_log(layout: &ArtifactLayout, job_id: &JobId, error: &WorkerError) {
    let path = layout.error_log(job_id);
    let body = format!(
        "{}\njob: {}\nerror: {}\n\n{:#?}\n",
        Utc::now().to_rfc3339(),
        job_id,
        error,
        error
    );

    if let Err(e) = write_file(&path, body).await {
        warn!(job_id = %job_id, path = %path.display(), "Failed to write diagnostic log: {}", e);
    }
}

async fn write_file(path: &Path, body: String) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}
