//! Scripted providers and a text-backed media toolchain.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use reel_media::{ConcatSpec, MediaError, MediaResult, MediaToolchain, Transform, TransformSpec};
use reel_models::{ArtifactLayout, JobId, RenderJob, RenderStatus};
use reel_providers::{
    FallbackChain, FallbackPolicy, ImageProvider, ImageRequest, Modality, Provider,
    ProviderError, ProviderRegistry, ProviderResult, SpeechOutput, SpeechProvider, VideoProvider,
    VideoRequest,
};
use reel_queue::{BroadcastProgress, ProgressEvent};
use reel_worker::{InMemoryRenderStore, RenderPipeline, RenderStore, WorkerConfig};

/// Seconds of narration each synthesized scene lasts.
pub const NARRATION_SECS: f64 = 10.0;
/// Seconds of each generated clip.
pub const CLIP_SECS: f64 = 4.0;

/// A script of `words` words that plans into `words / 70` scenes.
pub fn script(words: usize) -> String {
    (0..words)
        .map(|i| if i % 10 == 9 { "shadow." } else { "shadow" })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn read_secs(path: &Path) -> f64 {
    tokio::fs::read_to_string(path)
        .await
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

async fn write_secs(path: &Path, secs: f64) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, secs.to_string()).await
}

/// Files hold their duration as text. Concat sums, mux takes the
/// shorter input, a stream loop writes its trimmed length.
#[derive(Default)]
pub struct TextToolchain {
    pub fail_vertical_short: bool,
}

#[async_trait]
impl MediaToolchain for TextToolchain {
    async fn probe(&self, path: &Path) -> f64 {
        read_secs(path).await
    }

    async fn concat(&self, spec: &ConcatSpec) -> MediaResult<()> {
        let mut total = 0.0;
        for input in &spec.inputs {
            total += read_secs(input).await;
        }
        write_secs(&spec.list_file, 0.0).await?;
        write_secs(&spec.output, total).await?;
        Ok(())
    }

    async fn transform(&self, spec: &TransformSpec) -> MediaResult<()> {
        let secs = match &spec.transform {
            Transform::StreamLoop { duration, .. } => *duration,
            Transform::MuxShortest => read_secs(&spec.inputs[0])
                .await
                .min(read_secs(&spec.inputs[1]).await),
            Transform::VerticalShort { .. } if self.fail_vertical_short => {
                return Err(MediaError::ffmpeg_failed("vertical short", None, Some(1)));
            }
            _ => read_secs(&spec.inputs[0]).await,
        };
        write_secs(&spec.output, secs).await?;
        Ok(())
    }
}

/// Speech that fails its first `failures` calls and can stall.
#[derive(Default)]
pub struct FakeSpeech {
    pub calls: AtomicU32,
    pub failures: u32,
    pub delay: Option<Duration>,
}

impl Provider for FakeSpeech {
    fn name(&self) -> &'static str {
        "fake_speech"
    }
}

#[async_trait]
impl SpeechProvider for FakeSpeech {
    async fn synthesize(&self, text: &str, output: &Path) -> ProviderResult<SpeechOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if call < self.failures {
            return Err(ProviderError::job_failed("fake_speech", "rate limited"));
        }
        write_secs(output, NARRATION_SECS).await?;
        Ok(SpeechOutput {
            path: output.to_path_buf(),
            characters: Some(text.len() as u64),
            request_id: None,
        })
    }
}

#[derive(Default)]
pub struct FakeImage {
    pub calls: AtomicU32,
}

impl Provider for FakeImage {
    fn name(&self) -> &'static str {
        "fake_image"
    }
}

#[async_trait]
impl ImageProvider for FakeImage {
    async fn generate(&self, _request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        write_secs(output, 0.0).await?;
        Ok(output.to_path_buf())
    }
}

/// Video that either always fails or writes a [`CLIP_SECS`] clip.
#[derive(Default)]
pub struct FakeVideo {
    pub calls: AtomicU32,
    pub always_fail: bool,
}

impl Provider for FakeVideo {
    fn name(&self) -> &'static str {
        "fake_video"
    }
}

#[async_trait]
impl VideoProvider for FakeVideo {
    async fn animate(&self, request: &VideoRequest, output: &Path) -> ProviderResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_fail {
            return Err(ProviderError::job_failed("fake_video", "moderation rejected prompt"));
        }
        if !request.image.exists() {
            return Err(ProviderError::invalid_response("fake_video", "scene image missing"));
        }
        write_secs(output, CLIP_SECS).await?;
        Ok(output.to_path_buf())
    }
}

/// Knobs for a [`Harness`].
#[derive(Default)]
pub struct HarnessOptions {
    pub speech: FakeSpeech,
    pub video: FakeVideo,
    pub fail_vertical_short: bool,
    pub job_timeout: Option<Duration>,
    pub max_concurrent_jobs: Option<usize>,
    pub shutdown_timeout: Option<Duration>,
}

/// A pipeline wired to fakes under a temporary media root.
pub struct Harness {
    _dir: TempDir,
    pub config: WorkerConfig,
    pub layout: ArtifactLayout,
    pub store: Arc<InMemoryRenderStore>,
    pub progress: Arc<BroadcastProgress>,
    pub speech: Arc<FakeSpeech>,
    pub images: Arc<FakeImage>,
    pub videos: Arc<FakeVideo>,
    pub pipeline: Arc<RenderPipeline>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(HarnessOptions::default())
    }

    pub fn with(options: HarnessOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let defaults = WorkerConfig::default();
        let config = WorkerConfig {
            media_root: dir.path().join("media"),
            retry_attempts: 1,
            retry_delay: Duration::ZERO,
            planner_seed: Some(7),
            job_timeout: options.job_timeout.unwrap_or(defaults.job_timeout),
            max_concurrent_jobs: options
                .max_concurrent_jobs
                .unwrap_or(defaults.max_concurrent_jobs),
            shutdown_timeout: options.shutdown_timeout.unwrap_or(Duration::from_secs(5)),
            ..defaults
        };

        let speech = Arc::new(options.speech);
        let images = Arc::new(FakeImage::default());
        let videos = Arc::new(options.video);
        let registry = ProviderRegistry::new(
            FallbackChain::<dyn SpeechProvider>::new(Modality::Speech, FallbackPolicy::Exhaustive)
                .with(speech.clone()),
            FallbackChain::<dyn ImageProvider>::new(Modality::Image, FallbackPolicy::Exhaustive)
                .with(images.clone()),
            FallbackChain::<dyn VideoProvider>::new(Modality::Video, FallbackPolicy::SingleHop)
                .with(videos.clone()),
        );

        let store = Arc::new(InMemoryRenderStore::new());
        let progress = Arc::new(BroadcastProgress::default());
        let toolchain = Arc::new(TextToolchain {
            fail_vertical_short: options.fail_vertical_short,
        });
        let pipeline = Arc::new(RenderPipeline::new(
            &config,
            store.clone(),
            progress.clone(),
            toolchain,
            registry,
        ));

        Self {
            layout: ArtifactLayout::new(config.media_root.clone()),
            _dir: dir,
            config,
            store,
            progress,
            speech,
            images,
            videos,
            pipeline,
        }
    }

    /// Current job snapshot; panics when the job was never planned.
    pub async fn snapshot(&self, job_id: &JobId) -> RenderJob {
        self.store.get(job_id).await.expect("job is tracked")
    }
}

/// Drain events already published on `rx`.
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Job statuses in order with consecutive repeats collapsed.
pub fn status_sequence(events: &[ProgressEvent]) -> Vec<RenderStatus> {
    let mut statuses: Vec<RenderStatus> = Vec::new();
    for event in events {
        if statuses.last() != Some(&event.update.status) {
            statuses.push(event.update.status);
        }
    }
    statuses
}
