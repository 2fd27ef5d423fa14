//! The response envelope returned once per turn.

use serde::{Deserialize, Serialize};

use crate::mode::Mode;
use crate::retrieval::ContextKind;

/// A converted file returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedFile {
    /// File bytes, base64 on the wire.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub file_name: String,
    pub media_type: String,
}

/// Everything the caller gets back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Reply text with any action directive removed.
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConvertedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_confirmation: Option<String>,
    pub mode: Mode,
    pub language: String,
    /// Provider whose output was used, `None` when no generation succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Whether a requested alternate failed and the primary answered.
    pub fell_back: bool,
    pub context: ContextKind,
    /// Id of the reminder created in this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_id: Option<i64>,
}

impl ResponseEnvelope {
    pub fn builder(mode: Mode, language: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder::new(mode, language)
    }
}

/// Accumulates envelope fields across turn stages.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    envelope: ResponseEnvelope,
    notices: Vec<String>,
}

impl EnvelopeBuilder {
    pub fn new(mode: Mode, language: impl Into<String>) -> Self {
        Self {
            envelope: ResponseEnvelope {
                reply: String::new(),
                image_url: None,
                video_url: None,
                conversion: None,
                voice_confirmation: None,
                mode,
                language: language.into(),
                provider: None,
                fell_back: false,
                context: ContextKind::None,
                reminder_id: None,
            },
            notices: Vec::new(),
        }
    }

    pub fn reply(mut self, reply: impl Into<String>) -> Self {
        self.envelope.reply = reply.into();
        self
    }

    /// Set the image URL unless one is already present.
    pub fn image_url_if_unset(mut self, url: Option<String>) -> Self {
        if self.envelope.image_url.is_none() {
            self.envelope.image_url = url;
        }
        self
    }

    pub fn image_url(mut self, url: Option<String>) -> Self {
        self.envelope.image_url = url;
        self
    }

    pub fn video_url(mut self, url: Option<String>) -> Self {
        self.envelope.video_url = url;
        self
    }

    pub fn conversion(mut self, conversion: Option<ConvertedFile>) -> Self {
        self.envelope.conversion = conversion;
        self
    }

    pub fn voice_confirmation(mut self, confirmation: Option<String>) -> Self {
        self.envelope.voice_confirmation = confirmation;
        self
    }

    pub fn provider(mut self, provider: Option<String>, fell_back: bool) -> Self {
        self.envelope.provider = provider;
        self.envelope.fell_back = fell_back;
        self
    }

    pub fn context(mut self, context: ContextKind) -> Self {
        self.envelope.context = context;
        self
    }

    pub fn reminder_id(mut self, id: Option<i64>) -> Self {
        self.envelope.reminder_id = id;
        self
    }

    /// Add a line appended to the reply when the envelope is built.
    pub fn notice(mut self, notice: impl Into<String>) -> Self {
        self.notices.push(notice.into());
        self
    }

    /// Finish the envelope. Notices are appended to the reply as separate
    /// paragraphs.
    pub fn build(self) -> ResponseEnvelope {
        let mut envelope = self.envelope;
        for notice in self.notices {
            if envelope.reply.trim().is_empty() {
                envelope.reply = notice;
            } else {
                envelope.reply = format!("{}\n\n{}", envelope.reply.trim_end(), notice);
            }
        }
        envelope
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.trim()).map_err(serde::de::Error::custom)
    }
}
