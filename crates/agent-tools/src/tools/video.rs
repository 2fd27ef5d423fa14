//! Video generation adapter.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{authorize, check_status, http_client};
use crate::error::ToolError;
use crate::tool::VideoGenerator;

/// Video rendering is slow; allow more time than the other collaborators.
const VIDEO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(180);

/// Video generation over HTTP: `{"prompt"}` in, `{"url"}` or `{"video_url"}` out.
pub struct HttpVideoGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    #[serde(default, alias = "video_url")]
    url: Option<String>,
}

impl HttpVideoGenerator {
    /// Create a new video generator for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(VIDEO_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl VideoGenerator for HttpVideoGenerator {
    async fn generate_video(&self, prompt: &str) -> Result<String, ToolError> {
        debug!("Requesting video generation ({} chars)", prompt.len());

        let request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "prompt": prompt }));
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let response = check_status(response).await?;

        let body: VideoResponse = response.json().await?;
        body.url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ToolError::ExecutionFailed("Video service returned no URL".to_string()))
    }
}
