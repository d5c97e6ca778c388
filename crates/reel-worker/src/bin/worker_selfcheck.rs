use std::path::Path;
use std::sync::Arc;

use reel_media::{check_ffmpeg, check_ffprobe, FfmpegToolchain};
use reel_providers::{ProviderConfig, ProviderRegistry};
use reel_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "worker-selfcheck: starting with media_root={}",
        config.media_root.display()
    );
    ensure_media_root(&config.media_root).await?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!("worker-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    let toolchain = Arc::new(FfmpegToolchain::new());
    let registry = ProviderRegistry::from_config(&ProviderConfig::from_env(), toolchain)?;
    let chains = [
        (registry.speech.modality(), registry.speech.is_empty(), registry.speech.attempt_order()),
        (registry.images.modality(), registry.images.is_empty(), registry.images.attempt_order()),
        (registry.videos.modality(), registry.videos.is_empty(), registry.videos.attempt_order()),
    ];
    for (modality, empty, order) in chains {
        if empty {
            anyhow::bail!("no {} providers configured", modality.as_str());
        }
        println!("worker-selfcheck: {} providers {:?}", modality.as_str(), order);
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_media_root<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("media root {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}
