//! Document text extraction adapter.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use super::{authorize, check_status, http_client, DEFAULT_TIMEOUT};
use crate::error::ToolError;
use crate::tool::TextExtractor;

/// Text extraction over HTTP: `{"media_type", "data": "<base64>"}` in,
/// `{"text"}` out.
pub struct HttpTextExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    text: String,
}

impl HttpTextExtractor {
    /// Create a new extractor for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(DEFAULT_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl TextExtractor for HttpTextExtractor {
    async fn extract_text(&self, data: &[u8], media_type: &str) -> Result<String, ToolError> {
        debug!("Extracting text from {} ({} bytes)", media_type, data.len());

        let request = self.client.post(&self.endpoint).json(&serde_json::json!({
            "media_type": media_type,
            "data": STANDARD.encode(data),
        }));
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let response = check_status(response).await?;

        let body: ExtractResponse = response.json().await?;
        Ok(body.text.trim().to_string())
    }
}
