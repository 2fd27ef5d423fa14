//! Configuration for GeminiBrain.

use brain_core::BrainError;
use std::env;

/// Default API base URL.
const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for GeminiBrain.
#[derive(Debug, Clone)]
pub struct GeminiBrainConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum output tokens.
    pub max_output_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,
}

impl Default for GeminiBrainConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: Some(4096),
            temperature: Some(0.7),
        }
    }
}

impl GeminiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.0-flash)
    /// - `GEMINI_MAX_OUTPUT_TOKENS` - Max output tokens (default: 4096)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: 0.7)
    ///
    /// The per-call timeout is owned by the orchestrator's dispatcher, not
    /// by this adapter.
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| BrainError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        let api_url = env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok());

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(Self {
            api_url,
            api_key,
            model,
            max_output_tokens: max_output_tokens.or(Some(4096)),
            temperature: temperature.or(Some(0.7)),
        })
    }

    /// Create a new configuration with required fields.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the API URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max output tokens.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Full `generateContent` endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}
