//! Echo brain implementation - echoes the user text back.

use brain_core::{async_trait, Brain, BrainError, GenerationRequest};

/// A simple brain that echoes the user text back.
///
/// Useful for testing the turn flow without any provider.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <user text>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError> {
        let text = request.user_text();
        if text.is_empty() {
            return Err(BrainError::EmptyResponse);
        }

        Ok(match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, text),
            None => text,
        })
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let brain = EchoBrain::new();
        let text = brain.generate(&GenerationRequest::text("Hello!")).await.unwrap();
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let brain = EchoBrain::with_prefix("Echo: ");
        let text = brain.generate(&GenerationRequest::text("Hello!")).await.unwrap();
        assert_eq!(text, "Echo: Hello!");
    }

    #[tokio::test]
    async fn test_echo_empty_is_error() {
        let brain = EchoBrain::new();
        let result = brain.generate(&GenerationRequest::default()).await;
        assert!(matches!(result, Err(BrainError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_brain_name_and_ready() {
        let brain = EchoBrain::new();
        assert_eq!(brain.name(), "EchoBrain");
        assert!(brain.is_ready().await);
    }
}
