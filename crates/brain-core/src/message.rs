//! Attachment and generation request types.

use serde::{Deserialize, Serialize};

use crate::history::HistoryMessage;

/// Coarse category of an inbound attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
    Video,
}

impl AttachmentKind {
    /// Infer the kind from a declared media type.
    ///
    /// Anything that is not an image or video is treated as a document.
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.starts_with("image/") {
            Self::Image
        } else if media_type.starts_with("video/") {
            Self::Video
        } else {
            Self::Document
        }
    }
}

/// A binary attachment sent with a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment category.
    pub kind: AttachmentKind,
    /// Original file name as supplied by the caller.
    pub file_name: String,
    /// Declared media type (e.g., "application/pdf").
    pub media_type: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment, inferring the kind from the media type.
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        let media_type = media_type.into();
        Self {
            kind: AttachmentKind::from_media_type(&media_type),
            file_name: file_name.into(),
            media_type,
            data,
        }
    }

    /// Check if this attachment is an image.
    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image
    }

    /// Check if this attachment is a document.
    pub fn is_document(&self) -> bool {
        self.kind == AttachmentKind::Document
    }

    /// Check if this attachment is a video.
    pub fn is_video(&self) -> bool {
        self.kind == AttachmentKind::Video
    }

    /// Lowercased file extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// One part of a multimodal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text.
    Text(String),
    /// Inlined binary payload (image, document, or video bytes).
    InlineData { media_type: String, data: Vec<u8> },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an inline data part from an attachment.
    pub fn inline(attachment: &Attachment) -> Self {
        Self::InlineData {
            media_type: attachment.media_type.clone(),
            data: attachment.data.clone(),
        }
    }

    /// The text of this part, if it is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

/// Provider-neutral generation request.
///
/// Adapters translate this into their own wire format. The final user turn is
/// carried as `parts`; prior turns are in `history`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// System instruction for this call.
    pub system_instruction: Option<String>,
    /// Prior turns, oldest first.
    pub history: Vec<HistoryMessage>,
    /// Parts of the current user turn.
    pub parts: Vec<ContentPart>,
    /// Ask the provider for a bare JSON object instead of prose.
    pub json_output: bool,
}

impl GenerationRequest {
    /// Create a request with a single text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::text(text)],
            ..Default::default()
        }
    }

    /// Set the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set the conversation history.
    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    /// All text parts of the current turn joined by blank lines.
    pub fn user_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of inline binary parts.
    pub fn inline_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::InlineData { .. }))
            .count()
    }
}
