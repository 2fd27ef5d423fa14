//! File conversion adapter.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{authorize, check_status, http_client, DEFAULT_TIMEOUT};
use crate::error::ToolError;
use crate::format::FileFormat;
use crate::tool::FileConverter;

/// File conversion over HTTP.
///
/// Request: `{"source": "docx", "target": "pdf", "data": "<base64>"}`.
/// Response: `{"data": "<base64>"}`.
pub struct HttpFileConverter {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConvertRequest<'a> {
    source: &'a FileFormat,
    target: &'a FileFormat,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    data: String,
}

impl HttpFileConverter {
    /// Create a new converter for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(DEFAULT_TIMEOUT)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

fn decode_payload(body: ConvertResponse) -> Result<Vec<u8>, ToolError> {
    let bytes = STANDARD
        .decode(body.data.trim())
        .map_err(|e| ToolError::ExecutionFailed(format!("Invalid base64 in response: {}", e)))?;
    if bytes.is_empty() {
        return Err(ToolError::ExecutionFailed(
            "Converter returned an empty file".to_string(),
        ));
    }
    Ok(bytes)
}

#[async_trait]
impl FileConverter for HttpFileConverter {
    async fn convert(
        &self,
        data: &[u8],
        source: &FileFormat,
        target: &FileFormat,
    ) -> Result<Vec<u8>, ToolError> {
        if data.is_empty() {
            return Err(ToolError::invalid("data", "file is empty"));
        }

        debug!("Converting {} bytes from {} to {}", data.len(), source, target);

        let payload = ConvertRequest {
            source,
            target,
            data: STANDARD.encode(data),
        };
        let request = self.client.post(&self.endpoint).json(&payload);
        let response = authorize(request, self.api_key.as_deref()).send().await?;
        let response = check_status(response).await?;

        decode_payload(response.json().await?)
    }
}
