//! Turn orchestrator for the assistant.
//!
//! This crate provides the [`TurnOrchestrator`] type which takes one user
//! turn (text, history, attachments, hints) and produces a
//! [`ResponseEnvelope`]: reply text plus any generated image or video URL,
//! converted file, or reminder confirmation.
//!
//! # Features
//!
//! - Classifies each turn into a [`Mode`] that shapes the system instruction
//! - Detects reminders and web-search needs with cheap text heuristics
//! - Routes context: caller-provided text beats knowledge-base retrieval
//! - Calls a primary provider with timeout, retry and backoff, optionally
//!   trying a named alternate first
//! - Extracts action directives from the model's free text and runs them
//!
//! # Architecture
//!
//! ```text
//! TurnRequest + Caller
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TURN ORCHESTRATOR                        │
//! │                                                             │
//! │  1. Classify mode and language                              │
//! │         ↓                                                   │
//! │  2. Detect intents                                          │
//! │     • reminder → save for signed-in callers                 │
//! │     • web search → prepend results                          │
//! │         ↓                                                   │
//! │  3. Resolve context (explicit / retrieved / none)           │
//! │         ↓                                                   │
//! │  4. FILE_CONVERSION: plan with model, fall back to          │
//! │     extension, convert                                      │
//! │     otherwise: generate (alternate → primary with retry)    │
//! │         ↓                                                   │
//! │  5. Extract action directive, dispatch side effect          │
//! │         ↓                                                   │
//! │  6. Build response envelope                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{Caller, TurnOrchestrator, TurnRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = TurnOrchestrator::from_env().await?;
//!
//!     let turn = TurnRequest::new("Draw me a lighthouse at dawn");
//!     let envelope = orchestrator.process(&turn, &Caller::anonymous()).await?;
//!
//!     println!("Reply: {}", envelope.reply);
//!     if let Some(url) = envelope.image_url {
//!         println!("Image: {}", url);
//!     }
//!     Ok(())
//! }
//! ```

mod actions;
mod config;
mod context;
mod dispatcher;
mod envelope;
mod error;
mod extractor;
mod intent;
mod mode;
mod orchestrator;
mod prompts;
mod reminders;
mod retrieval;
mod turn;

// Public exports
pub use actions::{ActionDirective, ActionDispatcher, SideEffectResult};
pub use config::OrchestratorConfig;
pub use context::Context;
pub use dispatcher::{neutral_request, GenerationResult, ProviderDispatcher, RetryPolicy};
pub use envelope::{ConvertedFile, EnvelopeBuilder, ResponseEnvelope};
pub use error::{GenerationError, OrchestratorError};
pub use extractor::{extract_action, Extraction};
pub use intent::{
    detect_language, detect_reminder, detect_web_search, language_name, resolve_language,
    search_query, ReminderIntent, ReminderKind, MAX_TITLE_CHARS,
};
pub use mode::{classify, resolve_mode, Mode};
pub use orchestrator::{TurnOrchestrator, TurnStage, REMINDER_UNAVAILABLE_NOTICE, SIGN_IN_NOTICE};
pub use prompts::{load_base_prompt, PromptLibrary, DEFAULT_BASE_PROMPT, DEFAULT_PROMPT_FILE};
pub use reminders::{DatabaseReminderStore, ReminderStore};
pub use retrieval::{
    filter_relevant, ContextBundle, ContextKind, RetrievalRouter, DEFAULT_RELEVANCE_THRESHOLD,
    DEFAULT_TOP_K, KNOWLEDGE_CONTEXT_HEADER, PROVIDED_CONTEXT_HEADER,
};
pub use turn::{Caller, TurnRequest};

// Re-export commonly used types from dependencies
pub use agent_tools::{FileFormat, Toolbox};
pub use brain_core::{Attachment, Brain, BrainError, GenerationRequest, HistoryMessage, Role};
pub use database::NewReminder;
pub use knowledge::{ScoredPassage, VectorIndex};
