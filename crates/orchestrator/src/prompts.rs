//! System instruction templates.

use std::env;
use std::path::Path;

use brain_core::{hash_prompt, Attachment};
use tracing::info;

use crate::intent::language_name;
use crate::mode::Mode;

/// Default path for the persona prompt file.
pub const DEFAULT_PROMPT_FILE: &str = "SYSTEM_PROMPT.md";

/// Embedded persona used when neither env var nor file provides one.
pub const DEFAULT_BASE_PROMPT: &str = r#"You are a helpful, friendly AI assistant.

Answer clearly and directly. Prefer short paragraphs and lists over walls of text.
When you are unsure, say so instead of guessing. Never invent sources, links or file contents.
Use any context provided in the message (search results, knowledge base passages, extracted document text) when it is relevant, and mention when an answer comes from it."#;

/// Media directive section appended to every non-conversion template.
const MEDIA_DIRECTIVES: &str = r#"MEDIA REQUESTS:
If the user explicitly asks you to create, draw or generate an image, include exactly one JSON object on its own line:
{"action": "generate_image", "prompt": "<detailed visual description>"}
If the user explicitly asks for a video, include exactly one JSON object on its own line:
{"action": "generate_video", "prompt": "<detailed scene description>"}
Write a short friendly sentence next to it. Never include these objects unless media was requested."#;

/// Strict template for the conversion pass. No persona, no prose.
const CONVERSION_TEMPLATE: &str = r#"You are a file conversion planner. The user attached one or more files and wants them converted.

Reply with a single JSON object and nothing else. No prose, no markdown, no code fences.
The object must have exactly this shape:
{"action": "file_conversion", "source_format": "<extension of the attached file>", "target_format": "<extension requested>", "original_filename": "<attached file name>"}

Rules:
- Formats are lowercase file extensions such as pdf, docx, xlsx, pptx, png, jpg, txt.
- "word" means docx, "excel" means xlsx, "powerpoint" means pptx.
- If the user did not name a target: pdf becomes docx; doc, docx, xls, xlsx and images become pdf."#;

const NORMAL_CHAT: &str = "MODE: General conversation. Be warm and concise.";

const FILE_ANALYSIS: &str = "MODE: File analysis. The user attached files. Read them carefully, \
summarize what they contain and answer questions about them. Quote exact figures and names from \
the files. If a file is unreadable, say which one.";

const CONTENT_WRITING: &str = "MODE: Content writing. Produce polished, ready-to-use text in the \
requested format and tone. Use headings only when the piece calls for them. Do not explain the \
text unless asked.";

const CODING_HELP: &str = "MODE: Coding help. Give correct, idiomatic code in fenced blocks with \
the language named. Explain the fix or approach briefly, point out edge cases, and never claim \
code was run.";

const TASK_ASSISTANT: &str = "MODE: Task assistant. Turn the request into a concrete, ordered \
plan with clear steps, time estimates where useful, and a short checklist at the end.";

const DEEP_SEARCH: &str = "MODE: Deep research. Build a thorough answer from the web search \
results in the message. Compare sources, note disagreements and dates, and cite sources by title \
and link.";

/// Load the persona prompt.
///
/// Priority:
/// 1. `ASSISTANT_SYSTEM_PROMPT` env var (if set and non-empty)
/// 2. Contents of prompt file (`ASSISTANT_PROMPT_FILE` or default `SYSTEM_PROMPT.md`)
/// 3. Embedded default prompt
pub fn load_base_prompt() -> String {
    if let Ok(prompt) = env::var("ASSISTANT_SYSTEM_PROMPT") {
        if !prompt.trim().is_empty() {
            info!("Using persona prompt from ASSISTANT_SYSTEM_PROMPT env var");
            return prompt.trim().to_string();
        }
    }

    let prompt_file =
        env::var("ASSISTANT_PROMPT_FILE").unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded persona prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default persona prompt");
    DEFAULT_BASE_PROMPT.to_string()
}

/// Load a prompt from a file path. `None` if missing, unreadable or blank.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builds the system instruction for each turn.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    base: String,
    base_hash: String,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PROMPT)
    }
}

impl PromptLibrary {
    /// Use the given persona prompt.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let base_hash = hash_prompt(&base);
        Self { base, base_hash }
    }

    /// Load the persona prompt from the environment and log its fingerprint.
    pub fn from_env() -> Self {
        let library = Self::new(load_base_prompt());
        info!("Persona prompt hash: {}", library.base_hash);
        library
    }

    /// SHA-256 fingerprint of the persona prompt.
    pub fn base_hash(&self) -> &str {
        &self.base_hash
    }

    /// Full system instruction for a mode.
    ///
    /// The caller's own instruction is appended for every mode except
    /// `FILE_CONVERSION`, whose strict-JSON contract stays untouched.
    pub fn system_instruction(
        &self,
        mode: Mode,
        language: &str,
        attachments: &[Attachment],
        caller_instruction: Option<&str>,
    ) -> String {
        if mode == Mode::FileConversion {
            return conversion_instruction(attachments);
        }

        let mut sections = vec![self.base.clone(), mode_section(mode).to_string()];

        if !attachments.is_empty() {
            sections.push(attachment_section(attachments));
        }

        sections.push(MEDIA_DIRECTIVES.to_string());
        sections.push(format!(
            "LANGUAGE: Reply in {} unless the user explicitly asks for another language.",
            language_name(language)
        ));

        if let Some(extra) = caller_instruction.map(str::trim).filter(|s| !s.is_empty()) {
            sections.push(format!("ADDITIONAL INSTRUCTIONS:\n{}", extra));
        }

        sections.join("\n\n")
    }
}

fn mode_section(mode: Mode) -> &'static str {
    match mode {
        Mode::NormalChat => NORMAL_CHAT,
        Mode::FileAnalysis => FILE_ANALYSIS,
        Mode::FileConversion => CONVERSION_TEMPLATE,
        Mode::ContentWriting => CONTENT_WRITING,
        Mode::CodingHelp => CODING_HELP,
        Mode::TaskAssistant => TASK_ASSISTANT,
        Mode::DeepSearch => DEEP_SEARCH,
    }
}

fn attachment_section(attachments: &[Attachment]) -> String {
    let names: Vec<String> = attachments
        .iter()
        .map(|a| format!("{} ({})", a.file_name, a.media_type))
        .collect();
    format!(
        "ATTACHMENTS: The user sent {} file(s): {}.",
        attachments.len(),
        names.join(", ")
    )
}

fn conversion_instruction(attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return CONVERSION_TEMPLATE.to_string();
    }
    format!("{}\n\n{}", CONVERSION_TEMPLATE, attachment_section(attachments))
}
