//! Inbound turn and caller identity.

use brain_core::{Attachment, HistoryMessage};
use serde::{Deserialize, Serialize};

use crate::mode::Mode;

/// One inbound user turn. Read-only for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub text: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    /// Decoded attachments; the HTTP layer fills these from base64.
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
    /// Caller-supplied context, used verbatim instead of retrieval.
    #[serde(default)]
    pub context: Option<String>,
    /// Caller-supplied system instruction, appended to the mode template.
    #[serde(default)]
    pub system_instruction: Option<String>,
    /// Explicit mode override.
    #[serde(default)]
    pub mode: Option<Mode>,
    /// Named alternate provider to try first.
    #[serde(default)]
    pub provider: Option<String>,
    /// Language hint; empty or `auto` means detect.
    #[serde(default)]
    pub language: Option<String>,
    /// The user's clock offset from UTC, for reminder times.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl TurnRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = Some(minutes);
        self
    }

    /// Caller context, if present and not blank.
    pub fn explicit_context(&self) -> Option<&str> {
        self.context.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Named alternate provider, if present and not blank.
    pub fn alternate_provider(&self) -> Option<&str> {
        self.provider.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn has_image(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}

/// Who sent the turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<String>,
}

impl Caller {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// An authenticated caller.
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// The user id when authenticated.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let turn = TurnRequest::new("hi").with_context("  ").with_provider("");
        assert!(turn.explicit_context().is_none());
        assert!(turn.alternate_provider().is_none());

        let turn = TurnRequest::new("hi").with_context(" facts ").with_provider(" groq ");
        assert_eq!(turn.explicit_context(), Some("facts"));
        assert_eq!(turn.alternate_provider(), Some("groq"));
    }

    #[test]
    fn test_caller_authentication() {
        assert!(!Caller::anonymous().is_authenticated());
        assert!(!Caller::authenticated(" ").is_authenticated());
        assert_eq!(Caller::authenticated("u1").user_id(), Some("u1"));
    }

    #[test]
    fn test_turn_deserializes_with_defaults() {
        let turn: TurnRequest =
            serde_json::from_str(r#"{"text": "hello", "mode": "CODING_HELP"}"#).unwrap();
        assert_eq!(turn.text, "hello");
        assert_eq!(turn.mode, Some(Mode::CodingHelp));
        assert!(turn.history.is_empty());
        assert!(turn.attachments.is_empty());
    }
}
