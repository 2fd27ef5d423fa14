//! Collaborator trait definitions.
//!
//! Each trait is one external capability the orchestrator reaches during a
//! turn. Implementations are expected to carry their own HTTP timeouts; the
//! orchestrator never retries these calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::format::FileFormat;

/// Produces an image for a prompt and returns where it can be fetched.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<String, ToolError>;
}

/// Produces a short video for a prompt and returns where it can be fetched.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn generate_video(&self, prompt: &str) -> Result<String, ToolError>;
}

/// Converts file bytes between formats.
#[async_trait]
pub trait FileConverter: Send + Sync {
    async fn convert(
        &self,
        data: &[u8],
        source: &FileFormat,
        target: &FileFormat,
    ) -> Result<Vec<u8>, ToolError>;
}

/// Extracts readable text from a document (OCR, PDF text layer, ...).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, data: &[u8], media_type: &str) -> Result<String, ToolError>;
}

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Real-time web search. An empty result list means "nothing found".
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ToolError>;
}
