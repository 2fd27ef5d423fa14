//! Provider dispatch: a named alternate first, then the primary with retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brain_core::{Brain, BrainError, ContentPart, GenerationRequest};
use tracing::{debug, info, warn};

use crate::error::GenerationError;

/// Retry behavior for the primary provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first call.
    pub max_retries: u32,
    /// Wait before the first retry; doubles for each further retry.
    pub backoff_base: Duration,
    /// Hard deadline for each primary call.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base: Duration::from_millis(2000),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Text produced for a turn and who produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
    pub provider: String,
    /// An alternate was requested but the primary answered.
    pub fell_back: bool,
}

/// Sends a request to exactly one provider's output path.
///
/// With an alternate named, that alternate is called once with a
/// provider-neutral copy of the request (text parts only). Any failure there,
/// including an unknown name, falls through to the primary. The primary gets
/// the full multimodal request, a per-call timeout, and retries on timeouts
/// and rate limits only.
#[derive(Clone)]
pub struct ProviderDispatcher {
    primary: Arc<dyn Brain>,
    alternates: HashMap<String, Arc<dyn Brain>>,
    policy: RetryPolicy,
}

impl ProviderDispatcher {
    pub fn new(primary: Arc<dyn Brain>) -> Self {
        Self {
            primary,
            alternates: HashMap::new(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register an alternate under its own name.
    pub fn with_alternate(self, brain: Arc<dyn Brain>) -> Self {
        let name = brain.name().to_string();
        self.with_named_alternate(name, brain)
    }

    /// Register an alternate under `name` (case-insensitive).
    pub fn with_named_alternate(mut self, name: impl Into<String>, brain: Arc<dyn Brain>) -> Self {
        self.alternates
            .insert(name.into().trim().to_lowercase(), brain);
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    /// Names of registered alternates, sorted.
    pub fn alternate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.alternates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Generate text, trying `alternate` first when named.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        alternate: Option<&str>,
    ) -> Result<GenerationResult, GenerationError> {
        let requested_alternate = alternate.map(str::trim).filter(|name| !name.is_empty());

        if let Some(name) = requested_alternate {
            match self.try_alternate(name, request).await {
                Ok(text) => {
                    info!(provider = %name, "Alternate provider answered");
                    return Ok(GenerationResult {
                        text,
                        provider: name.to_lowercase(),
                        fell_back: false,
                    });
                }
                Err(e) => {
                    warn!(provider = %name, "Alternate provider failed, falling back to primary: {}", e);
                }
            }
        }

        let text = self.call_primary(request).await?;
        Ok(GenerationResult {
            text,
            provider: self.primary.name().to_string(),
            fell_back: requested_alternate.is_some(),
        })
    }

    async fn try_alternate(&self, name: &str, request: &GenerationRequest) -> Result<String, BrainError> {
        let brain = self
            .alternates
            .get(&name.to_lowercase())
            .ok_or_else(|| BrainError::Configuration(format!("unknown provider '{}'", name)))?;

        let text = brain.generate(&neutral_request(request)).await?;
        if text.trim().is_empty() {
            return Err(BrainError::EmptyResponse);
        }
        Ok(text)
    }

    async fn call_primary(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let provider = self.primary.name().to_string();
        let mut backoff = self.policy.backoff_base;
        let mut last_error = None;
        let mut attempts = 0;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                warn!(
                    provider = %provider,
                    "Primary provider failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.policy.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            attempts += 1;

            let outcome = match tokio::time::timeout(self.policy.timeout, self.primary.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(BrainError::Timeout),
            };

            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(provider = %provider, attempts, "Primary provider answered");
                    return Ok(text);
                }
                Ok(_) => {
                    return Err(GenerationError {
                        provider,
                        attempts,
                        source: BrainError::EmptyResponse,
                    });
                }
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(GenerationError {
                        provider,
                        attempts,
                        source: e,
                    });
                }
            }
        }

        Err(GenerationError {
            provider,
            attempts,
            source: last_error.unwrap_or(BrainError::Timeout),
        })
    }
}

/// Provider-neutral copy of a request: system instruction, role-normalized
/// history and text parts. Binary parts stay with the primary.
pub fn neutral_request(request: &GenerationRequest) -> GenerationRequest {
    GenerationRequest {
        system_instruction: request.system_instruction.clone(),
        history: request.history.clone(),
        parts: request
            .parts
            .iter()
            .filter(|part| matches!(part, ContentPart::Text(_)))
            .cloned()
            .collect(),
        json_output: request.json_output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::Attachment;
    use mock_brain::{DelayedBrain, EchoBrain, FailingBrain, FailureKind, ScriptedBrain};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_primary_only() {
        let dispatcher = ProviderDispatcher::new(Arc::new(EchoBrain::new()));
        let result = dispatcher
            .generate(&GenerationRequest::text("hello"), None)
            .await
            .unwrap();
        assert_eq!(result.text, "hello");
        assert_eq!(result.provider, "EchoBrain");
        assert!(!result.fell_back);
    }

    #[tokio::test]
    async fn test_alternate_success_skips_primary() {
        let primary = Arc::new(ScriptedBrain::new("gemini").reply("from primary"));
        let alternate = Arc::new(ScriptedBrain::new("groq").reply("from groq"));
        let dispatcher =
            ProviderDispatcher::new(primary.clone()).with_alternate(alternate.clone());

        let result = dispatcher
            .generate(&GenerationRequest::text("hi"), Some("GROQ"))
            .await
            .unwrap();
        assert_eq!(result.text, "from groq");
        assert_eq!(result.provider, "groq");
        assert!(!result.fell_back);
        assert_eq!(primary.call_count(), 0);
        assert_eq!(alternate.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_alternate_falls_back_once() {
        let primary = Arc::new(ScriptedBrain::new("gemini").reply("from primary"));
        let alternate = Arc::new(FailingBrain::new("groq", FailureKind::Unauthorized));
        let dispatcher = ProviderDispatcher::new(primary.clone())
            .with_alternate(alternate.clone())
            .with_policy(fast_policy());

        let result = dispatcher
            .generate(&GenerationRequest::text("hi"), Some("groq"))
            .await
            .unwrap();
        assert_eq!(result.text, "from primary");
        assert_eq!(result.provider, "gemini");
        assert!(result.fell_back);
        assert_eq!(alternate.call_count(), 1);
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_alternate_falls_back() {
        let primary = Arc::new(ScriptedBrain::new("gemini").reply("ok"));
        let dispatcher = ProviderDispatcher::new(primary.clone());
        let result = dispatcher
            .generate(&GenerationRequest::text("hi"), Some("nope"))
            .await
            .unwrap();
        assert!(result.fell_back);
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let primary = Arc::new(
            ScriptedBrain::new("gemini")
                .fail(BrainError::RateLimited("slow down".to_string()))
                .fail(BrainError::Timeout)
                .reply("third time lucky"),
        );
        let dispatcher = ProviderDispatcher::new(primary.clone()).with_policy(fast_policy());

        let result = dispatcher.generate(&GenerationRequest::text("hi"), None).await.unwrap();
        assert_eq!(result.text, "third time lucky");
        assert_eq!(primary.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let primary = Arc::new(FailingBrain::new("gemini", FailureKind::RateLimited));
        let dispatcher = ProviderDispatcher::new(primary.clone()).with_policy(fast_policy());

        let err = dispatcher.generate(&GenerationRequest::text("hi"), None).await.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(primary.call_count(), 3);
        assert!(matches!(err.source, BrainError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let primary = Arc::new(FailingBrain::new("gemini", FailureKind::Server));
        let dispatcher = ProviderDispatcher::new(primary.clone()).with_policy(fast_policy());

        let err = dispatcher.generate(&GenerationRequest::text("hi"), None).await.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(err.provider, "gemini");
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_primary_response_fails_without_retry() {
        let primary = Arc::new(ScriptedBrain::new("gemini").reply("   "));
        let dispatcher = ProviderDispatcher::new(primary.clone()).with_policy(fast_policy());

        let err = dispatcher.generate(&GenerationRequest::text("hi"), None).await.unwrap_err();
        assert!(matches!(err.source, BrainError::EmptyResponse));
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_primary_times_out_and_retries() {
        let primary = Arc::new(DelayedBrain::with_secs(EchoBrain::new(), 120));
        let dispatcher = ProviderDispatcher::new(primary).with_policy(RetryPolicy {
            max_retries: 2,
            backoff_base: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        });

        let started = tokio::time::Instant::now();
        let err = dispatcher.generate(&GenerationRequest::text("hi"), None).await.unwrap_err();
        assert!(matches!(err.source, BrainError::Timeout));
        assert_eq!(err.attempts, 3);
        // Three 60s deadlines plus 2s and 4s of backoff
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(186) && elapsed < Duration::from_secs(187));
    }

    #[test]
    fn test_neutral_request_drops_binary_parts() {
        let image = Attachment::new("a.png", "image/png", vec![1, 2, 3]);
        let mut request = GenerationRequest::text("describe").with_system_instruction("sys");
        request.parts.push(ContentPart::inline(&image));
        request.json_output = true;

        let neutral = neutral_request(&request);
        assert_eq!(neutral.parts, vec![ContentPart::text("describe")]);
        assert_eq!(neutral.system_instruction.as_deref(), Some("sys"));
        assert!(neutral.json_output);
        assert_eq!(request.inline_count(), 1);
    }
}
