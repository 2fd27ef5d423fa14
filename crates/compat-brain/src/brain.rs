//! CompatBrain implementation for OpenAI-compatible APIs.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use brain_core::{async_trait, Brain, BrainError, ContentPart, GenerationRequest};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatContentPart, ChatMessage,
    ImageUrl, ResponseFormat,
};
use crate::config::CompatBrainConfig;

/// An alternate provider speaking the OpenAI chat completions dialect.
///
/// The adapter is stateless: history comes in with each request, already
/// role-normalized. Image parts are sent as `data:` URIs; other binary parts
/// are replaced by a short text note because these providers cannot read
/// raw documents.
pub struct CompatBrain {
    client: Client,
    config: CompatBrainConfig,
}

impl CompatBrain {
    /// Create a new CompatBrain with the given configuration.
    pub fn new(config: CompatBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "CompatBrain '{}' initialized with model: {}",
            config.name, config.model
        );

        Ok(Self { client, config })
    }

    /// Create a CompatBrain for a named provider from environment variables.
    ///
    /// See [`CompatBrainConfig::from_env`] for the variables read.
    pub fn from_env(name: &str) -> Result<Self, BrainError> {
        Self::new(CompatBrainConfig::from_env(name)?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &CompatBrainConfig {
        &self.config
    }

    /// Build the messages array for a chat completion request.
    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::new();

        if let Some(ref instruction) = request.system_instruction {
            messages.push(ChatMessage::system(instruction.clone()));
        }

        for turn in &request.history {
            messages.push(ChatMessage::text(turn.role.as_str(), turn.text.clone()));
        }

        let has_images = request.parts.iter().any(|part| {
            matches!(part, ContentPart::InlineData { media_type, .. } if media_type.starts_with("image/"))
        });

        if has_images {
            let parts = request.parts.iter().map(Self::convert_part).collect();
            messages.push(ChatMessage::user_parts(parts));
        } else {
            let text = request
                .parts
                .iter()
                .map(|part| match Self::convert_part(part) {
                    ChatContentPart::Text { text } => text,
                    ChatContentPart::ImageUrl { .. } => String::new(),
                })
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            messages.push(ChatMessage::text("user", text));
        }

        messages
    }

    fn convert_part(part: &ContentPart) -> ChatContentPart {
        match part {
            ContentPart::Text(text) => ChatContentPart::Text { text: text.clone() },
            ContentPart::InlineData { media_type, data } if media_type.starts_with("image/") => {
                ChatContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{};base64,{}", media_type, STANDARD.encode(data)),
                    },
                }
            }
            ContentPart::InlineData { media_type, data } => ChatContentPart::Text {
                text: format!("[binary attachment omitted: {}, {} bytes]", media_type, data.len()),
            },
        }
    }

    /// Make a chat completion request.
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );

        debug!(
            "Sending request to provider '{}' ({} messages)",
            self.config.name,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
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
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);
            return Err(BrainError::from_status(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Brain for CompatBrain {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError> {
        let completion_request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: Self::build_messages(request),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: request.json_output.then(ResponseFormat::json_object),
        };

        let completion = self.chat_completion(completion_request).await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage ({}) - prompt: {}, completion: {}, total: {}",
                self.config.name, usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BrainError::EmptyResponse)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
