//! Error types for provider operations.

use thiserror::Error;

/// Errors that can occur while a provider generates text.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The provider signalled a rate limit (HTTP 429 or equivalent).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The call did not finish within the allotted time.
    #[error("request timed out")]
    Timeout,

    /// Transport-level failure (connect, DNS, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered but produced no usable text.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The adapter is misconfigured (missing key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The response could not be interpreted.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

impl BrainError {
    /// Whether the primary-provider retry loop may try this call again.
    ///
    /// Only timeouts and explicit rate-limit signals qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Timeout)
    }

    /// Map an HTTP status and body to the matching error variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 {
            Self::RateLimited(message)
        } else {
            Self::Api { status, message }
        }
    }
}
