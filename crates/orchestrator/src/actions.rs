//! Action directives and their side effects.

use agent_tools::{converted_file_name, FileFormat, Toolbox};
use brain_core::Attachment;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::envelope::ConvertedFile;

/// A structured request embedded in generated text.
///
/// At most one directive is honored per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDirective {
    /// Generate an image for the prompt.
    GenerateImage { prompt: String },

    /// Generate a short video for the prompt.
    GenerateVideo { prompt: String },

    /// Convert an attached file.
    FileConversion {
        #[serde(default, alias = "source_format", skip_serializing_if = "Option::is_none")]
        source: Option<FileFormat>,
        #[serde(default, alias = "target_format", skip_serializing_if = "Option::is_none")]
        target: Option<FileFormat>,
        #[serde(
            default,
            alias = "original_filename",
            alias = "filename",
            skip_serializing_if = "Option::is_none"
        )]
        file_name: Option<String>,
    },
}

impl ActionDirective {
    /// The `action` tag value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GenerateImage { .. } => "generate_image",
            Self::GenerateVideo { .. } => "generate_video",
            Self::FileConversion { .. } => "file_conversion",
        }
    }

    /// Media directives need a non-empty prompt.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::GenerateImage { prompt } | Self::GenerateVideo { prompt } => {
                !prompt.trim().is_empty()
            }
            Self::FileConversion { .. } => true,
        }
    }

    /// A conversion directive that leaves everything to the extension fallback.
    pub fn fallback_conversion() -> Self {
        Self::FileConversion {
            source: None,
            target: None,
            file_name: None,
        }
    }
}

/// What a dispatched directive contributed to the envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideEffectResult {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub conversion: Option<ConvertedFile>,
    /// Replaces the generated reply when set.
    pub reply: Option<String>,
}

const VIDEO_APOLOGY: &str =
    "Sorry, I couldn't create that video right now. Please try again in a little while.";

/// Runs the side effect a directive asks for.
///
/// Failures never escape: image falls back to the free URL template, video
/// apologizes, conversion explains what went wrong.
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    toolbox: Toolbox,
}

impl ActionDispatcher {
    pub fn new(toolbox: Toolbox) -> Self {
        Self { toolbox }
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    /// Execute one directive against the turn's attachments.
    pub async fn dispatch(
        &self,
        directive: &ActionDirective,
        attachments: &[Attachment],
    ) -> SideEffectResult {
        info!(action = directive.kind(), "Dispatching action");

        match directive {
            ActionDirective::GenerateImage { prompt } => SideEffectResult {
                image_url: Some(self.generate_image(prompt).await),
                ..Default::default()
            },
            ActionDirective::GenerateVideo { prompt } => self.generate_video(prompt).await,
            ActionDirective::FileConversion {
                source,
                target,
                file_name,
            } => {
                self.convert(source.clone(), target.clone(), file_name.as_deref(), attachments)
                    .await
            }
        }
    }

    async fn generate_image(&self, prompt: &str) -> String {
        if let Some(generator) = &self.toolbox.image {
            match generator.generate_image(prompt).await {
                Ok(url) if !url.trim().is_empty() => return url,
                Ok(_) => warn!("Image generator returned an empty URL, using free fallback"),
                Err(e) => warn!("Image generation failed, using free fallback: {}", e),
            }
        }
        self.toolbox.free_image_url(prompt)
    }

    async fn generate_video(&self, prompt: &str) -> SideEffectResult {
        let Some(generator) = &self.toolbox.video else {
            warn!("Video requested but no video generator is configured");
            return apology();
        };

        match generator.generate_video(prompt).await {
            Ok(url) if !url.trim().is_empty() => SideEffectResult {
                video_url: Some(url),
                ..Default::default()
            },
            Ok(_) => {
                warn!("Video generator returned an empty URL");
                apology()
            }
            Err(e) => {
                warn!("Video generation failed: {}", e);
                apology()
            }
        }
    }

    async fn convert(
        &self,
        source: Option<FileFormat>,
        target: Option<FileFormat>,
        file_name: Option<&str>,
        attachments: &[Attachment],
    ) -> SideEffectResult {
        let Some(attachment) = pick_attachment(attachments, file_name) else {
            return failure("no file was attached. Please attach the file you want converted.");
        };

        let source = known(source)
            .or_else(|| FileFormat::from_file_name(&attachment.file_name))
            .or_else(|| attachment.extension().map(|ext| FileFormat::parse(&ext)));
        let target = known(target).or_else(|| source.as_ref().and_then(FileFormat::default_target));

        let (Some(source), Some(target)) = (source, target) else {
            return failure(&format!(
                "I can't tell which format to convert {} to. Please name a target format such as pdf or docx.",
                attachment.file_name
            ));
        };

        if source == target {
            return failure(&format!(
                "{} is already a {} file.",
                attachment.file_name,
                target.extension().to_uppercase()
            ));
        }

        let Some(converter) = &self.toolbox.converter else {
            return failure("the conversion service is not configured.");
        };

        info!(
            file = %attachment.file_name,
            source = %source,
            target = %target,
            "Converting file"
        );

        match converter.convert(&attachment.data, &source, &target).await {
            Ok(data) if !data.is_empty() => {
                let converted_name = converted_file_name(&attachment.file_name, &target);
                let reply = format!(
                    "Done! I converted {} to {}. Your file {} is ready to download.",
                    attachment.file_name,
                    target.extension().to_uppercase(),
                    converted_name
                );
                SideEffectResult {
                    conversion: Some(ConvertedFile {
                        data,
                        file_name: converted_name,
                        media_type: target.media_type().to_string(),
                    }),
                    reply: Some(reply),
                    ..Default::default()
                }
            }
            Ok(_) => failure("the conversion service returned an empty file."),
            Err(e) => {
                warn!("File conversion failed: {}", e);
                failure(&e.to_string())
            }
        }
    }
}

/// The attachment named by the directive, else the first non-video one.
fn pick_attachment<'a>(attachments: &'a [Attachment], file_name: Option<&str>) -> Option<&'a Attachment> {
    if let Some(name) = file_name.map(str::trim).filter(|n| !n.is_empty()) {
        if let Some(found) = attachments
            .iter()
            .find(|a| a.file_name.eq_ignore_ascii_case(name))
        {
            return Some(found);
        }
    }
    attachments
        .iter()
        .find(|a| !a.is_video())
        .or_else(|| attachments.first())
}

/// Drop blank format names the model sometimes emits.
fn known(format: Option<FileFormat>) -> Option<FileFormat> {
    format.filter(|f| !f.extension().is_empty())
}

fn apology() -> SideEffectResult {
    SideEffectResult {
        reply: Some(VIDEO_APOLOGY.to_string()),
        ..Default::default()
    }
}

fn failure(reason: &str) -> SideEffectResult {
    SideEffectResult {
        reply: Some(format!("File conversion failed: {}", reason)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tools::{async_trait, FileConverter, ImageGenerator, ToolError, VideoGenerator};
    use std::sync::{Arc, Mutex};

    struct FixedImage(Result<String, String>);

    #[async_trait]
    impl ImageGenerator for FixedImage {
        async fn generate_image(&self, _prompt: &str) -> Result<String, ToolError> {
            self.0.clone().map_err(ToolError::ExecutionFailed)
        }
    }

    struct BrokenVideo;

    #[async_trait]
    impl VideoGenerator for BrokenVideo {
        async fn generate_video(&self, _prompt: &str) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("quota exceeded".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingConverter {
        calls: Mutex<Vec<(FileFormat, FileFormat)>>,
    }

    #[async_trait]
    impl FileConverter for RecordingConverter {
        async fn convert(
            &self,
            data: &[u8],
            source: &FileFormat,
            target: &FileFormat,
        ) -> Result<Vec<u8>, ToolError> {
            self.calls.lock().unwrap().push((source.clone(), target.clone()));
            let mut out = data.to_vec();
            out.extend_from_slice(target.extension().as_bytes());
            Ok(out)
        }
    }

    fn pdf() -> Attachment {
        Attachment::new("report.pdf", "application/pdf", b"%PDF".to_vec())
    }

    #[test]
    fn test_directive_parsing_and_aliases() {
        let directive: ActionDirective =
            serde_json::from_str(r#"{"action": "generate_image", "prompt": "a red fox"}"#).unwrap();
        assert_eq!(directive, ActionDirective::GenerateImage { prompt: "a red fox".to_string() });

        let directive: ActionDirective = serde_json::from_str(
            r#"{"action": "file_conversion", "source_format": "DOCX", "target_format": "pdf", "original_filename": "notes.docx"}"#,
        )
        .unwrap();
        assert_eq!(
            directive,
            ActionDirective::FileConversion {
                source: Some(FileFormat::Docx),
                target: Some(FileFormat::Pdf),
                file_name: Some("notes.docx".to_string()),
            }
        );

        assert!(serde_json::from_str::<ActionDirective>(r#"{"action": "launch_rocket"}"#).is_err());
        assert!(!ActionDirective::GenerateVideo { prompt: " ".to_string() }.is_valid());
    }

    #[tokio::test]
    async fn test_image_success_and_fallback() {
        let directive = ActionDirective::GenerateImage { prompt: "a red fox".to_string() };

        let ok = ActionDispatcher::new(
            Toolbox::new().with_image(Arc::new(FixedImage(Ok("https://cdn/fox.png".to_string())))),
        );
        let result = ok.dispatch(&directive, &[]).await;
        assert_eq!(result.image_url.as_deref(), Some("https://cdn/fox.png"));
        assert!(result.reply.is_none());

        let broken = ActionDispatcher::new(
            Toolbox::new().with_image(Arc::new(FixedImage(Err("down".to_string())))),
        );
        let result = broken.dispatch(&directive, &[]).await;
        assert_eq!(
            result.image_url.as_deref(),
            Some("https://image.pollinations.ai/prompt/a%20red%20fox")
        );

        let result = ActionDispatcher::default().dispatch(&directive, &[]).await;
        assert!(result.image_url.unwrap().contains("a%20red%20fox"));
    }

    #[tokio::test]
    async fn test_video_failure_apologizes() {
        let dispatcher = ActionDispatcher::new(Toolbox::new().with_video(Arc::new(BrokenVideo)));
        let directive = ActionDirective::GenerateVideo { prompt: "waves".to_string() };
        let result = dispatcher.dispatch(&directive, &[]).await;
        assert!(result.video_url.is_none());
        assert_eq!(result.reply.as_deref(), Some(VIDEO_APOLOGY));
    }

    #[tokio::test]
    async fn test_conversion_extension_fallback() {
        let converter = Arc::new(RecordingConverter::default());
        let dispatcher = ActionDispatcher::new(Toolbox::new().with_converter(converter.clone()));

        let result = dispatcher
            .dispatch(&ActionDirective::fallback_conversion(), &[pdf()])
            .await;

        let converted = result.conversion.unwrap();
        assert_eq!(converted.file_name, "report.docx");
        assert_eq!(converted.data, b"%PDFdocx".to_vec());
        assert!(converted.media_type.contains("wordprocessingml"));
        assert_eq!(
            converter.calls.lock().unwrap().as_slice(),
            &[(FileFormat::Pdf, FileFormat::Docx)]
        );
        assert!(result.reply.unwrap().contains("report.docx"));
        assert!(result.image_url.is_none());
    }

    #[tokio::test]
    async fn test_conversion_failures_are_explained() {
        let dispatcher = ActionDispatcher::default();

        let result = dispatcher.dispatch(&ActionDirective::fallback_conversion(), &[]).await;
        assert!(result.reply.unwrap().starts_with("File conversion failed: no file"));

        let result = dispatcher.dispatch(&ActionDirective::fallback_conversion(), &[pdf()]).await;
        assert_eq!(
            result.reply.as_deref(),
            Some("File conversion failed: the conversion service is not configured.")
        );

        let text = Attachment::new("notes.txt", "text/plain", b"hi".to_vec());
        let result = dispatcher.dispatch(&ActionDirective::fallback_conversion(), &[text]).await;
        assert!(result.reply.unwrap().contains("can't tell which format"));

        let same = ActionDirective::FileConversion {
            source: None,
            target: Some(FileFormat::Pdf),
            file_name: None,
        };
        let result = dispatcher.dispatch(&same, &[pdf()]).await;
        assert!(result.reply.unwrap().contains("already a PDF file"));
        assert!(result.conversion.is_none());
    }

    #[test]
    fn test_pick_attachment_prefers_named_file() {
        let video = Attachment::new("clip.mp4", "video/mp4", vec![0]);
        let attachments = vec![video, pdf(), Attachment::new("b.docx", "application/msword", vec![0])];
        assert_eq!(pick_attachment(&attachments, Some("B.DOCX")).unwrap().file_name, "b.docx");
        assert_eq!(pick_attachment(&attachments, Some("missing.pdf")).unwrap().file_name, "report.pdf");
        assert_eq!(pick_attachment(&attachments, None).unwrap().file_name, "report.pdf");
        assert!(pick_attachment(&[], None).is_none());
    }
}
