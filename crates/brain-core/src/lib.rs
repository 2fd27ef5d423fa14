//! Core trait and types for language-model provider adapters.
//!
//! Every provider the orchestrator can talk to is wrapped in a [`Brain`]
//! adapter that accepts one provider-neutral [`GenerationRequest`] and returns
//! plain text or a [`BrainError`]. Providers never leak their own payload
//! shapes past the adapter, so adding a provider means writing one adapter.
//!
//! This crate defines:
//!
//! - [`Brain`] - The trait that all provider adapters implement
//! - [`GenerationRequest`] / [`ContentPart`] - Provider-neutral request types
//! - [`Attachment`] / [`AttachmentKind`] - Inbound binary attachments
//! - [`HistoryMessage`] / [`Role`] - Role-normalized conversation history
//! - [`BrainError`] - Error types, including the retryable subset
//!
//! # Example
//!
//! ```rust
//! use brain_core::{async_trait, Brain, BrainError, GenerationRequest};
//!
//! struct FixedBrain;
//!
//! #[async_trait]
//! impl Brain for FixedBrain {
//!     async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError> {
//!         Ok(format!("You said: {}", request.user_text()))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "FixedBrain"
//!     }
//! }
//! ```

mod error;
mod history;
mod message;
mod prompt;
mod trait_def;

pub use error::BrainError;
pub use history::{HistoryMessage, Role};
pub use message::{Attachment, AttachmentKind, ContentPart, GenerationRequest};
pub use prompt::{hash_prompt, short_hash};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
