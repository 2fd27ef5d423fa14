//! Image generation adapter and the free image URL fallback.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{authorize, check_status, http_client, DEFAULT_TIMEOUT};
use crate::error::ToolError;
use crate::tool::ImageGenerator;

/// Template for the keyless image service used when generation fails.
pub const DEFAULT_FREE_IMAGE_URL: &str = "https://image.pollinations.ai/prompt/{prompt}";

/// Build a direct image URL from a template containing `{prompt}`.
///
/// The prompt is percent-encoded (spaces as `%20`). No request is made.
pub fn free_image_url(template: &str, prompt: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(prompt.trim().as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    if template.contains("{prompt}") {
        template.replace("{prompt}", &encoded)
    } else {
        format!("{}/{}", template.trim_end_matches('/'), encoded)
    }
}

/// Image generation over HTTP.
///
/// Sends `{"prompt": ...}` and accepts either `{"url": ...}` or the
/// OpenAI-style `{"data": [{"url": ...}]}` response.
pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default, alias = "image_url")]
    url: Option<String>,
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

impl ImageResponse {
    fn into_url(self) -> Option<String> {
        self.url
            .or_else(|| self.data.into_iter().find_map(|d| d.url))
            .filter(|url| !url.trim().is_empty())
    }
}

impl HttpImageGenerator {
    /// Create a new image generator for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(DEFAULT_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate_image(&self, prompt: &str) -> Result<String, ToolError> {
        debug!("Requesting image generation ({} chars)", prompt.len());

        let request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "prompt": prompt }));
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let response = check_status(response).await?;

        let body: ImageResponse = response.json().await?;
        body.into_url()
            .ok_or_else(|| ToolError::ExecutionFailed("Image service returned no URL".to_string()))
    }
}
