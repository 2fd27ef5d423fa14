//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::GenerationRequest;

/// A normalization adapter around one language-model provider.
///
/// Implementations translate a [`GenerationRequest`] into the provider's wire
/// format and reduce whatever the provider answers to plain text. This trait
/// is object-safe and is used as `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate a completion for the request.
    ///
    /// # Returns
    ///
    /// The generated text, or an error. Adapters map HTTP 429 to
    /// [`BrainError::RateLimited`] and client timeouts to
    /// [`BrainError::Timeout`] so callers can decide what to retry.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError>;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;

    /// Check if the provider is ready to accept requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
