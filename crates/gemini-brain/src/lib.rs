//! Primary provider adapter for the Gemini `generateContent` API.
//!
//! The primary provider is the only one that receives the full multimodal
//! turn: inline image bytes, inline document bytes, and the mode-selected
//! system instruction. When the orchestrator asks for strict JSON (file
//! conversion mode) the adapter sets `responseMimeType` accordingly.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_brain::{GeminiBrain, GeminiBrainConfig};
//!
//! # fn main() -> Result<(), brain_core::BrainError> {
//! let config = GeminiBrainConfig::from_env()?;
//! let brain = GeminiBrain::new(config)?;
//! # Ok(())
//! # }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::GeminiBrain;
pub use config::GeminiBrainConfig;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, GenerationRequest};
