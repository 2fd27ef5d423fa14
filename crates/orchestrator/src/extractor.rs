//! Pulls an action directive out of free-form generated text.
//!
//! Models embed directives in prose, in code fences, or wrapped in arrays.
//! Three strategies of increasing leniency are tried in order and the first
//! valid directive wins. Nothing here panics or errors: a failed parse is
//! simply "no action".

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::actions::ActionDirective;

static ACTION_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""action"\s*:\s*"(generate_image|generate_video|file_conversion)""#)
        .expect("action anchor pattern")
});

static FLAT_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\{[^{}]*?"action"[^{}]*?\}"#).expect("flat object pattern")
});

static ARRAY_WRAPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\[\s*\{.*?"action".*?\}\s*\]"#).expect("array pattern")
});

static EMPTY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_-]*[ \t]*\n?\s*```").expect("empty fence pattern"));

static EXTRA_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank lines pattern"));

/// A directive found in generated text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub directive: ActionDirective,
    /// The text with the directive (and any emptied code fence) removed.
    pub cleaned_text: String,
    /// The exact substring that was parsed.
    pub raw: String,
}

/// A directive and the byte range it occupied.
struct Found {
    directive: ActionDirective,
    start: usize,
    end: usize,
}

/// Find the first valid directive in `text`.
pub fn extract_action(text: &str) -> Option<Extraction> {
    let found = anchored_scan(text)
        .or_else(|| flat_object(text))
        .or_else(|| array_wrapped(text))?;

    let raw = text[found.start..found.end].to_string();
    debug!(action = found.directive.kind(), "Extracted action directive");

    Some(Extraction {
        cleaned_text: scrub(text, found.start, found.end),
        directive: found.directive,
        raw,
    })
}

/// Strategy 1: anchor on a recognized `"action": "<kind>"`, then find the
/// balanced object around it.
fn anchored_scan(text: &str) -> Option<Found> {
    ACTION_ANCHOR.find_iter(text).find_map(|anchor| {
        let (start, object, directive) = enclosing_object(text, anchor.start(), anchor.end())
            .find_map(|(start, object)| Some((start, object, parse_directive(object)?)))?;
        let end = start + object.len();
        let (start, end) = widen_to_array(text, start, end);
        Some(Found {
            directive,
            start,
            end,
        })
    })
}

/// Strategy 2: a single flat object mentioning `action`.
fn flat_object(text: &str) -> Option<Found> {
    FLAT_OBJECT.find_iter(text).find_map(|m| {
        let directive = parse_directive(m.as_str())?;
        Some(Found {
            directive,
            start: m.start(),
            end: m.end(),
        })
    })
}

/// Strategy 3: an array of objects; the first element is used.
fn array_wrapped(text: &str) -> Option<Found> {
    ARRAY_WRAPPED.find_iter(text).find_map(|m| {
        let items: Vec<serde_json::Value> = serde_json::from_str(m.as_str()).ok()?;
        let first = items.into_iter().next()?;
        let directive: ActionDirective = serde_json::from_value(first).ok()?;
        directive.is_valid().then_some(Found {
            directive,
            start: m.start(),
            end: m.end(),
        })
    })
}

fn parse_directive(candidate: &str) -> Option<ActionDirective> {
    match serde_json::from_str::<ActionDirective>(candidate) {
        Ok(directive) if directive.is_valid() => Some(directive),
        Ok(directive) => {
            debug!(action = directive.kind(), "Rejected directive with empty prompt");
            None
        }
        Err(e) => {
            debug!("Candidate directive did not parse: {}", e);
            None
        }
    }
}

/// Balanced objects that start before `anchor_start` and span the whole
/// anchor, nearest first.
///
/// Each `{` is scanned forward with string awareness, so braces inside
/// earlier string values cannot hide the real opening brace.
fn enclosing_object(
    text: &str,
    anchor_start: usize,
    anchor_end: usize,
) -> impl Iterator<Item = (usize, &str)> {
    text[..anchor_start]
        .rmatch_indices('{')
        .filter_map(move |(start, _)| {
            let object = extract_balanced_json(&text[start..])?;
            (start + object.len() >= anchor_end).then_some((start, object))
        })
}

/// The balanced `{...}` prefix of `s`, honoring quoted strings and escapes.
///
/// `None` if `s` does not start with `{` or never closes.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Grow `[start, end)` to cover `[ ... ]` when the object is the only
/// element of an array.
fn widen_to_array(text: &str, start: usize, end: usize) -> (usize, usize) {
    let before = text[..start].trim_end();
    let after = text[end..].trim_start();
    if before.ends_with('[') && after.starts_with(']') {
        let new_start = before.len() - 1;
        let new_end = text.len() - after.len() + 1;
        (new_start, new_end)
    } else {
        (start, end)
    }
}

/// Remove `[start, end)` and tidy what is left.
fn scrub(text: &str, start: usize, end: usize) -> String {
    let mut cleaned = String::with_capacity(text.len());
    cleaned.push_str(&text[..start]);
    cleaned.push_str(&text[end..]);

    let cleaned = EMPTY_FENCE.replace_all(&cleaned, "");
    let cleaned = EXTRA_BLANK_LINES.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}
