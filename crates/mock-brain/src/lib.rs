//! Mock provider implementations for testing.
//!
//! This crate provides mock implementations of the `Brain` trait:
//! - `EchoBrain` - Echoes the user text back
//! - `ScriptedBrain` - Replays a queue of canned results and records requests
//! - `FailingBrain` - Always fails with a fixed error kind
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For production use, see the `gemini-brain` and `compat-brain` crates.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, GenerationRequest, ScriptedBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::new("primary").reply("Hello!");
//!
//!     let text = brain.generate(&GenerationRequest::text("hi")).await?;
//!     assert_eq!(text, "Hello!");
//!     assert_eq!(brain.call_count(), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;
mod scripted;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, GenerationRequest};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use failing::{FailingBrain, FailureKind};
pub use scripted::ScriptedBrain;
