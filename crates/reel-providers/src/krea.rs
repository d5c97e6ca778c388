//! Krea text-to-image and image-to-video.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{download, ensure_success, png_data_uri, poll_until, PollConfig, PollStatus};
use crate::provider::{ImageProvider, ImageRequest, Provider, VideoProvider, VideoRequest};

const NAME: &str = "krea";
pub const DEFAULT_BASE_URL: &str = "https://api.krea.ai";

/// Image jobs: every 3 s, 60 polls.
pub const IMAGE_POLL: PollConfig = PollConfig::new(Duration::from_secs(3), 60);
/// Video jobs: every 5 s, 60 polls.
pub const VIDEO_POLL: PollConfig = PollConfig::new(Duration::from_secs(5), 60);

#[derive(Debug, Serialize)]
struct ImageBody<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ImageJob {
    job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageJobStatus {
    status: String,
    image_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct VideoBody<'a> {
    version: &'a str,
    prompt: &'a str,
    image: String,
}

#[derive(Debug, Deserialize)]
struct VideoJob {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoJobStatus {
    status: String,
    uri: Option<String>,
}

/// Krea client. Serves both the image and video modalities.
#[derive(Clone)]
pub struct Krea {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    image_poll: PollConfig,
    video_poll: PollConfig,
}

impl Krea {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_poll: IMAGE_POLL,
            video_poll: VIDEO_POLL,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll(mut self, image: PollConfig, video: PollConfig) -> Self {
        self.image_poll = image;
        self.video_poll = video;
        self
    }

    fn key(&self) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: NAME })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, key: &str) -> ProviderResult<T> {
        let response = self.http.get(url).bearer_auth(key).send().await?;
        Ok(ensure_success(NAME, response).await?.json().await?)
    }
}

impl Provider for Krea {
    fn name(&self) -> &'static str {
        NAME
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ImageProvider for Krea {
    async fn generate(&self, request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf> {
        let key = self.key()?;
        info!(scene = request.scene_index, "Krea generating image");

        let response = self
            .http
            .post(format!("{}/generate/image/bfl/flux-1-dev", self.base_url))
            .bearer_auth(key)
            .json(&ImageBody {
                prompt: &request.prompt,
                width: 1024,
                height: 576,
            })
            .send()
            .await?;
        let job: ImageJob = ensure_success(NAME, response).await?.json().await?;
        let job_id = job
            .job_id
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no job_id returned"))?;

        let status_url = format!("{}/job/{}", self.base_url, job_id);
        let status_url = status_url.as_str();
        let image_url = poll_until(NAME, self.image_poll, move || async move {
            let status: ImageJobStatus = self.get_json(status_url, key).await?;
            Ok(match (status.status.as_str(), status.image_url) {
                ("completed", Some(url)) => PollStatus::Ready(url),
                ("failed", _) => PollStatus::Failed("image generation failed".to_string()),
                _ => PollStatus::Pending,
            })
        })
        .await?;

        download(&self.http, NAME, &image_url, output).await
    }
}

#[async_trait]
impl VideoProvider for Krea {
    async fn animate(&self, request: &VideoRequest, output: &Path) -> ProviderResult<PathBuf> {
        let key = self.key()?;
        info!(scene = request.scene_index, "Krea animating scene");

        let response = self
            .http
            .post(format!("{}/v1/video/generations", self.base_url))
            .bearer_auth(key)
            .json(&VideoBody {
                version: "video-gen-v1",
                prompt: &request.prompt,
                image: png_data_uri(&request.image).await?,
            })
            .send()
            .await?;
        let job: VideoJob = ensure_success(NAME, response).await?.json().await?;
        let id = job
            .id
            .ok_or_else(|| ProviderError::invalid_response(NAME, "no video task id returned"))?;

        let status_url = format!("{}/v1/video/{}", self.base_url, id);
        let status_url = status_url.as_str();
        let video_url = poll_until(NAME, self.video_poll, move || async move {
            let status: VideoJobStatus = self.get_json(status_url, key).await?;
            Ok(match (status.status.as_str(), status.uri) {
                ("succeeded", Some(uri)) => PollStatus::Ready(uri),
                ("succeeded", None) => PollStatus::Failed("task succeeded without a uri".to_string()),
                ("failed", _) => PollStatus::Failed("video generation task failed".to_string()),
                _ => PollStatus::Pending,
            })
        })
        .await?;

        download(&self.http, NAME, &video_url, output).await
    }
}
