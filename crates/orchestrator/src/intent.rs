//! Auxiliary intent detectors: reminders, reply language, web search.
//!
//! All detectors are pure functions of the turn text (plus a clock for
//! reminders) and never fail; "nothing detected" is `None`.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::mode::Mode;

static REMINDER_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(remind\s+me|set\s+(?:a\s+|an\s+|my\s+)?(?:reminder|alarm)|wake\s+me(?:\s+up)?|alarm\s+for|yaad\s+dila)",
    )
    .expect("reminder trigger pattern")
});

static RELATIVE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bin\s+(\d+|an?|one)\s*(minutes?|mins?|hours?|hrs?|days?)\b")
        .expect("relative time pattern")
});

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:at|for|by)\s+(\d{1,2})(?::(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)?(?:\s|$|[,.!?])")
        .expect("clock time pattern")
});

static TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btomorrow\b").expect("tomorrow pattern"));

static TITLE_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:to|about|that)\s+(.+)$").expect("title clause pattern"));

static TIME_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:in\s+(?:\d+|an?|one)\s*(?:minutes?|mins?|hours?|hrs?|days?)|(?:at|by)\s+\d{1,2}(?::\d{2})?\s*(?:a\.?m\.?|p\.?m\.?)?|tomorrow|today|tonight)\b",
    )
    .expect("time noise pattern")
});

/// Hours after which a reminder fires when no time can be resolved.
const DEFAULT_LEAD_HOURS: i64 = 1;

/// Longest reminder title kept; the rest of the clause is dropped.
pub const MAX_TITLE_CHARS: usize = 120;

/// Local time of day used for "tomorrow" without a clock time.
const DEFAULT_TOMORROW_HOUR: u32 = 9;

/// Whether a reminder rings as an alarm or is a plain reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Reminder,
    Alarm,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Alarm => "alarm",
        }
    }
}

/// A reminder the user asked for in this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderIntent {
    pub title: String,
    /// Target instant in UTC.
    pub remind_at: DateTime<Utc>,
    /// Offset the user's clock times were read in.
    pub offset: FixedOffset,
    pub notify: bool,
    pub alarm: bool,
    pub voice: bool,
    pub kind: ReminderKind,
}

impl ReminderIntent {
    /// Target time formatted for storage (`YYYY-MM-DDTHH:MM:SSZ`).
    pub fn remind_at_rfc3339(&self) -> String {
        self.remind_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Short spoken confirmation, e.g. "Reminder set: take medicine at 07:30".
    ///
    /// Times are rendered in the user's offset; days other than today are
    /// named ("tomorrow", or the date).
    pub fn confirmation(&self, now: DateTime<Utc>) -> String {
        let local = self.remind_at.with_timezone(&self.offset);
        let today = now.with_timezone(&self.offset).date_naive();
        let time = local.format("%H:%M");
        let when = if local.date_naive() == today {
            format!("at {}", time)
        } else if Some(local.date_naive()) == today.succ_opt() {
            format!("tomorrow at {}", time)
        } else {
            format!("on {} at {}", local.format("%d %b"), time)
        };

        match self.kind {
            ReminderKind::Alarm => format!("Alarm set: {} {}", self.title, when),
            ReminderKind::Reminder => format!("Reminder set: {} {}", self.title, when),
        }
    }
}

/// Detect a reminder or alarm request.
///
/// `utc_offset_minutes` is the user's clock offset; out-of-range offsets are
/// treated as UTC. A request without a resolvable time is scheduled
/// one hour from `now`.
pub fn detect_reminder(
    text: &str,
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> Option<ReminderIntent> {
    let trigger = REMINDER_TRIGGER.find(text)?;
    let lower = text.to_lowercase();

    let alarm = lower.contains("alarm") || lower.contains("wake me");
    let voice = lower.contains("call me") || lower.contains("voice");
    let kind = if alarm {
        ReminderKind::Alarm
    } else {
        ReminderKind::Reminder
    };

    let offset =
        FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix());
    let remind_at = resolve_time(text, now, offset)
        .unwrap_or_else(|| now + Duration::hours(DEFAULT_LEAD_HOURS));

    let title = extract_title(&text[trigger.end()..]).unwrap_or_else(|| match kind {
        ReminderKind::Alarm => "Alarm".to_string(),
        ReminderKind::Reminder => "Reminder".to_string(),
    });

    Some(ReminderIntent {
        title,
        remind_at,
        offset,
        notify: true,
        alarm,
        voice,
        kind,
    })
}

fn resolve_time(text: &str, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Some(caps) = RELATIVE_TIME.captures(text) {
        let amount = match caps[1].to_lowercase().as_str() {
            "a" | "an" | "one" => 1,
            digits => digits.parse::<i64>().ok()?,
        };
        let unit = caps[2].to_lowercase();
        let delta = if unit.starts_with('m') {
            TimeDelta::try_minutes(amount)
        } else if unit.starts_with('h') {
            TimeDelta::try_hours(amount)
        } else {
            TimeDelta::try_days(amount)
        }?;
        return now.checked_add_signed(delta);
    }

    let local_now = now.with_timezone(&offset);
    let tomorrow = TOMORROW.is_match(text);

    let time = match CLOCK_TIME.captures(text) {
        Some(caps) => {
            let mut hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
            if let Some(meridiem) = caps.get(3) {
                let pm = meridiem.as_str().to_lowercase().starts_with('p');
                if hour == 0 || hour > 12 {
                    return None;
                }
                hour = match (pm, hour) {
                    (false, 12) => 0,
                    (true, 12) => 12,
                    (true, h) => h + 12,
                    (false, h) => h,
                };
            }
            NaiveTime::from_hms_opt(hour, minute, 0)?
        }
        None if tomorrow => NaiveTime::from_hms_opt(DEFAULT_TOMORROW_HOUR, 0, 0)?,
        None => return None,
    };

    let mut date = local_now.date_naive();
    if tomorrow {
        date = date.succ_opt()?;
    } else if date.and_time(time) <= local_now.naive_local() {
        // Clock times already passed today roll over to tomorrow
        date = date.succ_opt()?;
    }

    let local = offset.from_local_datetime(&date.and_time(time)).single()?;
    Some(local.with_timezone(&Utc))
}

fn extract_title(after_trigger: &str) -> Option<String> {
    let caps = TITLE_CLAUSE.captures(after_trigger)?;
    let cleaned = TIME_NOISE.replace_all(&caps[1], " ");
    let title = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect::<String>();
    let title = title.trim_end().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Resolve the reply language: a caller hint wins unless empty or `auto`,
/// otherwise the dominant script of the text decides.
pub fn resolve_language(hint: Option<&str>, text: &str) -> String {
    match hint.map(str::trim) {
        Some(hint) if !hint.is_empty() && !hint.eq_ignore_ascii_case("auto") => {
            hint.to_ascii_lowercase()
        }
        _ => detect_language(text).to_string(),
    }
}

/// Guess a language tag from the script of the text. Latin (or no letters)
/// is English.
pub fn detect_language(text: &str) -> &'static str {
    let mut counts = [0usize; 8];
    const TAGS: [&str; 8] = ["hi", "ar", "bn", "ta", "ru", "ko", "ja", "zh"];

    for c in text.chars() {
        let index = match c as u32 {
            0x0900..=0x097F => 0,
            0x0600..=0x06FF | 0x0750..=0x077F => 1,
            0x0980..=0x09FF => 2,
            0x0B80..=0x0BFF => 3,
            0x0400..=0x04FF => 4,
            0xAC00..=0xD7AF | 0x1100..=0x11FF => 5,
            0x3040..=0x30FF => 6,
            0x4E00..=0x9FFF => 7,
            _ => continue,
        };
        counts[index] += 1;
    }

    // Kana anywhere means Japanese even when kanji dominate
    if counts[6] > 0 {
        return "ja";
    }

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(_, count)| **count)
        .map_or("en", |(index, _)| TAGS[index])
}

/// Human-readable name for a language tag, for prompt templates.
pub fn language_name(tag: &str) -> &str {
    match tag {
        "en" => "English",
        "hi" => "Hindi",
        "ar" => "Arabic",
        "bn" => "Bengali",
        "ta" => "Tamil",
        "ru" => "Russian",
        "ko" => "Korean",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "pt" => "Portuguese",
        other => other,
    }
}

/// Words and phrases that signal a need for fresh information.
const SEARCH_TRIGGERS: &[&str] = &[
    "latest",
    "news",
    "today",
    "tonight",
    "current",
    "currently",
    "right now",
    "this week",
    "this month",
    "this year",
    "recent",
    "recently",
    "weather",
    "forecast",
    "price of",
    "stock price",
    "exchange rate",
    "score",
    "who won",
    "election",
    "search the web",
    "search for",
    "look up",
    "google",
    "trending",
    "release date",
];

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b20[2-9]\d\b").expect("year pattern"));

/// Conversational openers stripped from the front of a search query.
const QUERY_FILLER: &[&str] = &[
    "hey",
    "hi",
    "please",
    "can you",
    "could you",
    "would you",
    "will you",
    "tell me",
    "show me",
    "let me know",
    "i want to know",
    "i would like to know",
    "do you know",
    "search the web for",
    "search for",
    "search",
    "look up",
    "google",
    "find out",
    "find",
    "about",
];

/// Maximum characters of a derived search query.
const MAX_QUERY_CHARS: usize = 200;

/// Decide whether this turn needs a web search and derive the query.
///
/// `DEEP_SEARCH` always searches; `FILE_CONVERSION` never does.
pub fn detect_web_search(text: &str, mode: Mode) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    match mode {
        Mode::FileConversion => None,
        Mode::DeepSearch => Some(search_query(text)),
        _ => {
            let lower = text.to_lowercase();
            let triggered = SEARCH_TRIGGERS.iter().any(|t| contains_phrase(&lower, t))
                || YEAR.is_match(&lower);
            triggered.then(|| search_query(text))
        }
    }
}

/// Strip conversational filler from the front and back of `text`.
///
/// Falls back to the trimmed original if stripping leaves nothing.
pub fn search_query(text: &str) -> String {
    let mut query = text
        .trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.'))
        .trim()
        .to_string();

    loop {
        let lower = query.to_lowercase();
        let stripped = QUERY_FILLER.iter().find_map(|filler| {
            let rest = lower.strip_prefix(filler)?;
            if !rest.starts_with(|c: char| c.is_whitespace() || c == ',') {
                return None;
            }
            query
                .get(filler.len()..)
                .map(|rest| rest.trim_start_matches([',', ' ']).to_string())
        });
        match stripped {
            Some(rest) if !rest.trim().is_empty() => query = rest,
            _ => break,
        }
    }

    for suffix in [" please", " for me"] {
        let cut = query.len().saturating_sub(suffix.len());
        if query.get(cut..).is_some_and(|tail| tail.eq_ignore_ascii_case(suffix)) {
            query.truncate(cut);
        }
    }

    let query = query.trim();
    let query = if query.is_empty() { text.trim() } else { query };
    query.chars().take(MAX_QUERY_CHARS).collect()
}

fn contains_phrase(lower: &str, phrase: &str) -> bool {
    lower.match_indices(phrase).any(|(start, _)| {
        let before = lower[..start].chars().next_back();
        let after = lower[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
