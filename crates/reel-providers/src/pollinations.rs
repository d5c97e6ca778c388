//! Pollinations keyless public image fallback.

use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ProviderResult;
use crate::http::download;
use crate::provider::{ImageProvider, ImageRequest, Provider};

const NAME: &str = "pollinations";
pub const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";

/// Keyless text-to-image via a GET URL.
#[derive(Clone)]
pub struct Pollinations {
    http: Client,
    base_url: String,
}

impl Pollinations {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Image URL for a prompt. Whitespace is collapsed before encoding and
    /// the scene index seeds the generator.
    pub fn image_url(&self, request: &ImageRequest) -> String {
        let clean = request.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        format!(
            "{}/prompt/{}?width=1280&height=720&nologo=true&seed={}",
            self.base_url,
            urlencoding::encode(&clean),
            request.scene_index
        )
    }
}

impl Provider for Pollinations {
    fn name(&self) -> &'static str {
        NAME
    }
}

#[async_trait]
impl ImageProvider for Pollinations {
    async fn generate(&self, request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf> {
        info!(scene = request.scene_index, "Using public image fallback");
        download(&self.http, NAME, &self.image_url(request), output).await
    }
}
