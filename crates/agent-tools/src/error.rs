//! Error types for collaborator calls.

use thiserror::Error;

/// Errors that can occur while calling an external collaborator.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No adapter is configured for this capability.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The remote service answered with a non-success status.
    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// General execution error.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Shorthand for an invalid parameter error.
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
