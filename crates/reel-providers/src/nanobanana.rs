//! NanoBanana text-to-image.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{download, ensure_success, poll_until, PollConfig, PollStatus};
use crate::provider::{ImageProvider, ImageRequest, Provider};

const NAME: &str = "nanobanana";
pub const DEFAULT_BASE_URL: &str = "https://api.nanobananaapi.ai/api/v1/nanobanana";

/// Every 3 s for up to five minutes.
pub const POLL: PollConfig = PollConfig::new(Duration::from_secs(3), 100);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    num_images: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordInfo {
    success_flag: Option<i64>,
    response: Option<RecordResponse>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordResponse {
    result_image_url: Option<String>,
}

/// NanoBanana client.
#[derive(Clone)]
pub struct NanoBanana {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    poll: PollConfig,
}

impl NanoBanana {
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

impl Provider for NanoBanana {
    fn name(&self) -> &'static str {
        NAME
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Map a record-info payload onto a poll outcome.
///
/// `successFlag`: 0 generating, 1 success, 2 create failed, 3 generate failed.
fn record_status(record: RecordInfo) -> PollStatus<String> {
    match record.success_flag {
        Some(1) => match record.response.and_then(|r| r.result_image_url) {
            Some(url) => PollStatus::Ready(url),
            None => PollStatus::Failed("returned no image URL".to_string()),
        },
        Some(2) | Some(3) => PollStatus::Failed(
            record
                .error_message
                .unwrap_or_else(|| "generation failed".to_string()),
        ),
        _ => PollStatus::Pending,
    }
}

#[async_trait]
impl ImageProvider for NanoBanana {
    async fn generate(&self, request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: NAME })?;
        info!(scene = request.scene_index, "NanoBanana generating image");

        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(key)
            .json(&GenerateBody {
                prompt: &request.prompt,
                kind: "TEXTTOIMAGE",
                num_images: 1,
            })
            .send()
            .await?;
        let envelope: Envelope<TaskData> = ensure_success(NAME, response).await?.json().await?;
        let task_id = match (envelope.code, envelope.data) {
            (200, Some(data)) => data.task_id,
            (_, _) => {
                return Err(ProviderError::job_failed(
                    NAME,
                    envelope.msg.unwrap_or_else(|| "start failed".to_string()),
                ))
            }
        };

        let http = &self.http;
        let record_url = format!("{}/record-info", self.base_url);
        let record_url = record_url.as_str();
        let task_id = task_id.as_str();
        let image_url = poll_until(NAME, self.poll, move || async move {
            let response = http
                .get(record_url)
                .query(&[("taskId", task_id)])
                .bearer_auth(key)
                .send()
                .await?;
            let record: RecordInfo = ensure_success(NAME, response).await?.json().await?;
            Ok(record_status(record))
        })
        .await?;

        download(&self.http, NAME, &image_url, output).await
    }
}
