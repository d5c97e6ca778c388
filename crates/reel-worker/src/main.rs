//! Render worker binary.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_media::FfmpegToolchain;
use reel_models::{RenderMode, RenderRequest, RenderStatus, StylePreset};
use reel_providers::{ProviderConfig, ProviderRegistry};
use reel_queue::{BroadcastProgress, FanoutProgress, ProgressEmitter, RedisProgressChannel};
use reel_worker::{metrics, InMemoryRenderStore, JobExecutor, RenderPipeline, WorkerConfig};

#[derive(Parser)]
#[command(name = "reel-worker", about = "Turn a narration script into a narrated video")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one script and wait for it to finish
    Render {
        /// Path to the narration script
        #[arg(long)]
        script: PathBuf,
        #[arg(long, default_value = "cinematic")]
        style: StylePreset,
        #[arg(long, default_value = "full")]
        mode: RenderMode,
        /// Spending limit in USD, overrides PLAN_LIMIT_USD
        #[arg(long)]
        limit: Option<f64>,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("reel=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Some(port) = config.metrics_port {
        metrics::init_metrics(port)?;
    }

    match cli.command {
        Command::Render {
            script,
            style,
            mode,
            limit,
        } => {
            let script = tokio::fs::read_to_string(&script)
                .await
                .with_context(|| format!("reading script {}", script.display()))?;
            let mut request = RenderRequest::new(script).with_style(style).with_mode(mode);
            if let Some(limit) = limit {
                request = request.with_plan_limit(limit);
            }
            render(config, request).await
        }
    }
}

async fn render(config: WorkerConfig, request: RenderRequest) -> anyhow::Result<()> {
    let toolchain = Arc::new(FfmpegToolchain::new().with_timeout(config.ffmpeg_timeout.as_secs()));
    let providers = ProviderRegistry::from_config(&ProviderConfig::from_env(), toolchain.clone())?;

    let broadcast = Arc::new(BroadcastProgress::default());
    let mut progress = FanoutProgress::new().with(broadcast.clone());
    if let Some(url) = &config.redis_url {
        match RedisProgressChannel::new(url) {
            Ok(channel) => progress = progress.with(Arc::new(channel)),
            Err(e) => warn!("Redis progress disabled: {}", e),
        }
    }
    info!("Progress sinks: {}", progress.len());
    let progress: Arc<dyn ProgressEmitter> = Arc::new(progress);

    let pipeline = Arc::new(RenderPipeline::new(
        &config,
        Arc::new(InMemoryRenderStore::new()),
        progress,
        toolchain,
        providers,
    ));
    let executor = Arc::new(JobExecutor::new(config, pipeline));

    let runner = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move { executor.run().await })
    };

    let mut events = broadcast.subscribe();
    let job_id = executor.submit(request).await?;
    info!("Submitted job {}", job_id);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            event = events.recv() => match event {
                Ok(event) if event.job_id == job_id => {
                    let update = &event.update;
                    match (update.scene, update.total_scenes) {
                        (Some(scene), Some(total)) => info!("{}: scene {}/{}", update.status, scene, total),
                        _ => info!("{}", update.status),
                    }
                    if update.status.is_terminal() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} progress events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    }

    executor.shutdown();
    runner.await??;

    let Some(job) = executor.status(&job_id).await else {
        bail!("job {} is not tracked", job_id);
    };
    println!("{}", serde_json::to_string_pretty(&job)?);

    if job.status == RenderStatus::Complete {
        info!("Worker shutdown complete");
        Ok(())
    } else {
        error!("Job {} ended as {}", job_id, job.status);
        bail!("render {}", job.status)
    }
}
