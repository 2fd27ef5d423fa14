//! Error types for orchestrator operations.

use agent_tools::ToolError;
use brain_core::BrainError;
use database::DatabaseError;
use knowledge::KnowledgeError;
use thiserror::Error;

/// The only error that fails a turn: no provider produced text.
#[derive(Debug, Error)]
#[error("generation failed via {provider} after {attempts} attempt(s): {source}")]
pub struct GenerationError {
    /// Provider whose failure ended the turn (always the primary).
    pub provider: String,
    /// Calls made to that provider.
    pub attempts: u32,
    #[source]
    pub source: BrainError,
}

impl GenerationError {
    /// Plain provider message for the caller, without internal framing.
    pub fn provider_message(&self) -> String {
        self.source.to_string()
    }
}

/// Errors from building or wiring the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Provider setup failed.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Knowledge base setup failed.
    #[error("knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// Tool setup failed.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// Reminder store failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
