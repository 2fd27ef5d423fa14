//! Alternate provider adapter for OpenAI-compatible chat completion APIs.
//!
//! Many providers (xAI Grok, OpenAI, DeepSeek, Groq, self-hosted gateways)
//! speak the same `/v1/chat/completions` dialect. One [`CompatBrain`] is
//! created per named provider and registered with the orchestrator's
//! provider dispatcher as an alternate.
//!
//! # Usage
//!
//! ```rust,no_run
//! use compat_brain::{CompatBrain, CompatBrainConfig};
//!
//! # fn main() -> Result<(), brain_core::BrainError> {
//! // Reads GROK_API_KEY, GROK_API_URL, GROK_MODEL, ...
//! let config = CompatBrainConfig::from_env("grok")?;
//! let brain = CompatBrain::new(config)?;
//! # Ok(())
//! # }
//! ```
//!
//! The message list is built from the role-normalized history, so every
//! provider sees the same binary user/assistant vocabulary.

mod api_types;
mod brain;
mod config;

pub use brain::CompatBrain;
pub use config::{provider_names_from_env, CompatBrainConfig, CompatBrainConfigBuilder};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, GenerationRequest};
