//! HTTP-backed collaborator adapters.
//!
//! Every adapter talks JSON to a single configured endpoint. Binary payloads
//! travel base64-encoded.

mod converter;
mod extractor;
mod image;
mod search;
mod video;

pub use converter::HttpFileConverter;
pub use extractor::HttpTextExtractor;
pub use image::{free_image_url, HttpImageGenerator, DEFAULT_FREE_IMAGE_URL};
pub use search::HttpWebSearch;
pub use video::HttpVideoGenerator;

use std::time::Duration;

use crate::error::ToolError;

/// Default timeout for collaborator calls.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the shared HTTP client used by the adapters.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .user_agent("turn-orchestrator/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| ToolError::ExecutionFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into a `ToolError::Service`.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ToolError::Service {
        status: status.as_u16(),
        message: truncate_utf8(message.trim(), 300),
    })
}

/// Attach a bearer token when one is configured.
pub(crate) fn authorize(
    request: reqwest::RequestBuilder,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

/// Truncate a string to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_utf8(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return input.to_string();
    }
    if max_bytes == 0 {
        return String::new();
    }

    let mut idx = max_bytes.min(input.len());
    while idx > 0 && !input.is_char_boundary(idx) {
        idx -= 1;
    }

    input[..idx].to_string()
}
