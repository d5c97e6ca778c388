//! Placeholder images for `IMAGE_PROVIDER=mock`.

use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};

use crate::error::ProviderResult;
use crate::http::download;
use crate::provider::{ImageProvider, ImageRequest, Provider};

const NAME: &str = "placeholder";
pub const DEFAULT_BASE_URL: &str = "https://placehold.co";

/// Downloads a labelled 1280x720 placeholder instead of generating.
#[derive(Clone)]
pub struct Placeholder {
    http: Client,
    base_url: String,
}

impl Placeholder {
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
}

impl Provider for Placeholder {
    fn name(&self) -> &'static str {
        NAME
    }
}

#[async_trait]
impl ImageProvider for Placeholder {
    async fn generate(&self, request: &ImageRequest, output: &Path) -> ProviderResult<PathBuf> {
        let url = format!("{}/1280x720?text=Scene+{}", self.base_url, request.scene_index);
        download(&self.http, NAME, &url, output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_downloads_labelled_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1280x720"))
            .and(query_param("text", "Scene 2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("images/scene_2.png");
        Placeholder::new(Client::new())
            .with_base_url(server.uri())
            .generate(
                &ImageRequest {
                    prompt: String::new(),
                    scene_index: 2,
                },
                &output,
            )
            .await
            .unwrap();

        assert!(output.exists());
    }
}
