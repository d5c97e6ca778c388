//! ElevenLabs text-to-speech.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{ensure_success, write_asset};
use crate::provider::{Provider, SpeechOutput, SpeechProvider};

const NAME: &str = "elevenlabs";
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const MODEL_ID: &str = "eleven_multilingual_v2";

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs client.
#[derive(Clone)]
pub struct ElevenLabs {
    http: Client,
    api_key: Option<String>,
    voice_id: String,
    base_url: String,
}

impl ElevenLabs {
    pub fn new(http: Client, api_key: Option<String>, voice_id: impl Into<String>) -> Self {
        Self {
            http,
            api_key,
            voice_id: voice_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Provider for ElevenLabs {
    fn name(&self) -> &'static str {
        NAME
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl SpeechProvider for ElevenLabs {
    async fn synthesize(&self, text: &str, output: &Path) -> ProviderResult<SpeechOutput> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials { provider: NAME })?;

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);
        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&SpeechBody {
                text,
                model_id: MODEL_ID,
            })
            .send()
            .await?;
        let response = ensure_success(NAME, response).await?;

        let characters = header_str(response.headers(), "x-character-count")
            .and_then(|v| v.parse::<u64>().ok());
        let request_id = header_str(response.headers(), "request-id");

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response(NAME, "empty audio body"));
        }
        let path = write_asset(output, &bytes).await?;

        if let Some(chars) = characters {
            metrics::counter!("reel_tts_characters_total").increment(chars);
        }
        info!(
            path = %path.display(),
            characters = ?characters,
            request_id = ?request_id,
            "Narration saved"
        );

        Ok(SpeechOutput {
            path,
            characters,
            request_id,
        })
    }
}
