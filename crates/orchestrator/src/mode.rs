//! Mode classification for incoming turns.

use std::fmt;

use brain_core::Attachment;
use serde::{Deserialize, Serialize};

/// What kind of help a turn is asking for.
///
/// Exactly one mode is chosen per turn. It selects the system instruction
/// template and whether the provider must answer with strict JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    NormalChat,
    FileAnalysis,
    FileConversion,
    ContentWriting,
    CodingHelp,
    TaskAssistant,
    DeepSearch,
}

impl Mode {
    /// Wire name, e.g. `FILE_CONVERSION`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NormalChat => "NORMAL_CHAT",
            Self::FileAnalysis => "FILE_ANALYSIS",
            Self::FileConversion => "FILE_CONVERSION",
            Self::ContentWriting => "CONTENT_WRITING",
            Self::CodingHelp => "CODING_HELP",
            Self::TaskAssistant => "TASK_ASSISTANT",
            Self::DeepSearch => "DEEP_SEARCH",
        }
    }

    /// Whether the provider must return a bare JSON object.
    pub fn requires_json(&self) -> bool {
        matches!(self, Self::FileConversion)
    }

    /// Whether this mode is one of the two attachment modes.
    pub fn is_file_mode(&self) -> bool {
        matches!(self, Self::FileConversion | Self::FileAnalysis)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrases that ask for a file to be converted.
const CONVERSION_PHRASES: &[&str] = &[
    "convert",
    "conversion",
    "to pdf",
    "into pdf",
    "as pdf",
    "as a pdf",
    "to word",
    "into word",
    "to docx",
    "into docx",
    "to doc",
    "to excel",
    "into excel",
    "to image",
    "to png",
    "to jpg",
    "turn this into",
    "turn it into",
    "change to",
    "change it to",
    "export as",
    "save as",
];

const CODING_WORDS: &[&str] = &[
    "code", "coding", "bug", "debug", "compile", "compiler", "python", "javascript", "typescript",
    "rust", "java", "kotlin", "golang", "sql", "html", "css", "regex", "function", "algorithm",
    "api", "exception", "traceback", "refactor", "programming", "npm", "cargo",
];

const CODING_PHRASES: &[&str] = &["stack trace", "syntax error", "unit test", "c++", "c#"];

/// Tokens that only appear in code.
const CODE_SHAPES: &[&str] = &[
    "```",
    "function(",
    "function ",
    "def ",
    "class ",
    "import ",
    "#include",
    "console.log",
    "println!",
    "public static",
    "=>",
    "!==",
    "===",
    "fn main",
    "</",
];

const WRITING_WORDS: &[&str] = &[
    "write", "draft", "essay", "article", "blog", "poem", "story", "letter", "email", "caption",
    "rewrite", "paraphrase", "proofread", "headline", "slogan", "bio", "speech", "script",
    "tagline", "copywriting",
];

const TASK_WORDS: &[&str] = &[
    "plan", "planning", "schedule", "todo", "checklist", "organize", "itinerary", "roadmap",
    "agenda", "prioritize", "steps", "timetable", "routine", "budget", "tasks",
];

const TASK_PHRASES: &[&str] = &["to-do", "to do list", "step by step", "help me plan"];

/// Classify a turn. Deterministic; never fails.
///
/// Attachments force `FILE_CONVERSION` (when a conversion phrase is present)
/// or `FILE_ANALYSIS`. Otherwise code beats writing beats task planning,
/// and everything else is `NORMAL_CHAT`.
pub fn classify(text: &str, attachments: &[Attachment]) -> Mode {
    let lower = text.to_lowercase();

    if !attachments.is_empty() {
        return if contains_any_phrase(&lower, CONVERSION_PHRASES) {
            Mode::FileConversion
        } else {
            Mode::FileAnalysis
        };
    }

    let words = words(&lower);

    if looks_like_code(text)
        || contains_any_word(&words, CODING_WORDS)
        || contains_any_phrase(&lower, CODING_PHRASES)
    {
        return Mode::CodingHelp;
    }

    if contains_any_word(&words, WRITING_WORDS) {
        return Mode::ContentWriting;
    }

    if contains_any_word(&words, TASK_WORDS) || contains_any_phrase(&lower, TASK_PHRASES) {
        return Mode::TaskAssistant;
    }

    Mode::NormalChat
}

/// Apply an explicit override on top of classification.
///
/// The override is honored as given, except that with attachments present an
/// override other than the two file modes is ignored.
pub fn resolve_mode(override_mode: Option<Mode>, text: &str, attachments: &[Attachment]) -> Mode {
    match override_mode {
        Some(mode) if attachments.is_empty() || mode.is_file_mode() => mode,
        _ => classify(text, attachments),
    }
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_any_word(words: &[&str], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.contains(w))
}

fn contains_any_phrase(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

/// Code shape: fenced blocks, language keywords, or dense punctuation.
fn looks_like_code(text: &str) -> bool {
    if CODE_SHAPES.iter().any(|shape| text.contains(shape)) {
        return true;
    }

    let trimmed = text.trim();
    let total = trimmed.chars().count();
    if total < 20 {
        return false;
    }
    let symbols = trimmed
        .chars()
        .filter(|c| matches!(c, '{' | '}' | '[' | ']' | ';' | '(' | ')'))
        .count();
    let lines_ending_in_semicolon = trimmed
        .lines()
        .filter(|line| line.trim_end().ends_with(';') || line.trim_end().ends_with('{'))
        .count();

    symbols * 100 / total >= 8 || lines_ending_in_semicolon >= 2
}
