//! Runway image-to-video.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{download, ensure_success, png_data_uri, poll_until, PollConfig, PollStatus};
use crate::provider::{Provider, VideoProvider, VideoRequest};

const NAME: &str = "runway";
pub const DEFAULT_BASE_URL: &str = "https://api.dev.runwayml.com";
const API_VERSION: &str = "2024-11-06";
const MODEL: &str = "gen3a_turbo";
const RATIO: &str = "1280:768";

/// Every 5 s for up to ten minutes.
pub const POLL: PollConfig = PollConfig::new(Duration::from_secs(5), 120);

/// The model only accepts 5 or 10 second clips.
pub fn snap_duration(requested: u32) -> u32 {
    if requested > 7 {
        10
    } else {
        5
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageToVideoBody<'a> {
    model: &'a str,
    prompt_image: String,
    prompt_text: &'a str,
    duration: u32,
    ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct TaskCreated {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    status: String,
    #[serde(default)]
    output: Vec<String>,
    failure: Option<String>,
    failure_code: Option<String>,
}

/// Runway client.
#[derive(Clone)]
pub struct Runway {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    poll: PollConfig,
}

impl Runway {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: POLL,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}

impl Provider for Runway {
    fn name(&self) -> &'static str {
        NAME
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

fn task_status(task: Task) -> PollStatus<String> {
    match task.status.as_str() {
        "SUCCEEDED" => match task.output.into_iter().next() {
            Some(url) => PollStatus::Ready(url),
            None => PollStatus::Failed("task completed but returned no URL".to_string()),
        },
        "FAILED" | "CANCELLED" => PollStatus::Failed(
            task.failure_code
                .or(task.failure)
                .unwrap_or_else(|| "Unknown".to_string()),
        ),
        _ => PollStatus::Pending,
    }
}

#[async_trait]
impl VideoProvider for Runway {
    async fn animate(&self, request: &VideoRequest, output: &Path) -> ProviderResult<PathBuf> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: NAME })?;
        let duration = snap_duration(request.duration);
        info!(scene = request.scene_index, duration, "Runway animating scene");

        let response = self
            .http
            .post(format!("{}/v1/image_to_video", self.base_url))
            .bearer_auth(key)
            .header("X-Runway-Version", API_VERSION)
            .json(&ImageToVideoBody {
                model: MODEL,
                prompt_image: png_data_uri(&request.image).await?,
                prompt_text: &request.prompt,
                duration,
                ratio: RATIO,
            })
            .send()
            .await?;
        let created: TaskCreated = ensure_success(NAME, response).await?.json().await?;

        let http = &self.http;
        let task_url = format!("{}/v1/tasks/{}", self.base_url, created.id);
        let task_url = task_url.as_str();
        let video_url = poll_until(NAME, self.poll, move || async move {
            let response = http
                .get(task_url)
                .bearer_auth(key)
                .header("X-Runway-Version", API_VERSION)
                .send()
                .await?;
            let task: Task = ensure_success(NAME, response).await?.json().await?;
            Ok(task_status(task))
        })
        .await?;

        download(&self.http, NAME, &video_url, output).await
    }
}
