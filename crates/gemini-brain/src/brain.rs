//! GeminiBrain implementation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use brain_core::{async_trait, Brain, BrainError, ContentPart, GenerationRequest, Role};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::config::GeminiBrainConfig;

/// The primary provider.
///
/// Stateless: history arrives with every request. The HTTP client carries no
/// timeout of its own; the dispatcher wraps each call in a deadline and
/// dropping the future aborts the request.
pub struct GeminiBrain {
    client: Client,
    config: GeminiBrainConfig,
}

impl GeminiBrain {
    /// Create a new GeminiBrain with the given configuration.
    pub fn new(config: GeminiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.is_empty() {
            return Err(BrainError::Configuration("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!("GeminiBrain initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a GeminiBrain from environment variables.
    ///
    /// See [`GeminiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(GeminiBrainConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiBrainConfig {
        &self.config
    }

    /// Translate a provider-neutral request into the Gemini wire format.
    fn build_request(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Content::text(role, turn.text.clone())
            })
            .collect();

        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::text(text.clone()),
                ContentPart::InlineData { media_type, data } => {
                    Part::inline(media_type.clone(), STANDARD.encode(data))
                }
            })
            .collect();

        contents.push(Content {
            role: Some("user".to_string()),
            parts,
        });

        let system_instruction = request.system_instruction.as_ref().map(|instruction| Content {
            role: None,
            parts: vec![Part::text(instruction.clone())],
        });

        let generation_config = GenerationConfig {
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
            response_mime_type: request
                .json_output
                .then(|| "application/json".to_string()),
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(generation_config),
        }
    }
}

/// Map a non-success status and body to a `BrainError`.
///
/// Gemini reports quota exhaustion as `RESOURCE_EXHAUSTED`, sometimes without
/// a 429 status.
fn map_error(status: u16, body: &str) -> BrainError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => {
            if api_error.error.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
                BrainError::RateLimited(api_error.error.message)
            } else {
                BrainError::from_status(status, api_error.error.message)
            }
        }
        Err(_) => BrainError::from_status(status, body.to_string()),
    }
}

#[async_trait]
impl Brain for GeminiBrain {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError> {
        let body = self.build_request(request);

        debug!(
            "Sending request to Gemini ({} history turns, {} inline parts, json={})",
            request.history.len(),
            request.inline_count(),
            request.json_output
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Gemini returned {}", status);
            return Err(map_error(status.as_u16(), &error_text));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Token usage - prompt: {}, candidates: {}, total: {}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        response
            .first_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BrainError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
