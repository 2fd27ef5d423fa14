//! Role-normalized conversation history.
//!
//! Callers send history with whatever role vocabulary their client uses
//! ("human", "model", "bot", ...). Everything is collapsed to a binary
//! user/assistant role before it reaches a provider adapter.

use serde::{Deserialize, Deserializer, Serialize};

/// Binary conversation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Normalize an arbitrary role label.
    ///
    /// Anything that names the model side of the conversation becomes
    /// `Assistant`; every other label (including unknown ones) is `User`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "assistant" | "model" | "bot" | "ai" | "system" | "gpt" | "agent" => Self::Assistant,
            _ => Self::User,
        }
    }

    /// Canonical wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Role::from_label(&label))
    }
}

/// A single prior turn in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Normalized role.
    pub role: Role,
    /// Message content.
    #[serde(alias = "content")]
    pub text: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}
