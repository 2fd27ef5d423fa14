//! Input validation for reminder fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Value outside the accepted set.
    Invalid { field: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for reminder titles.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum allowed length for user ids.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Accepted intent tags.
pub const INTENTS: &[&str] = &["reminder", "alarm"];

/// Validate a reminder title.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Empty("title".to_string()));
    }
    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
            actual: length,
        });
    }
    Ok(())
}

/// Validate a user id.
pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Empty("user_id".to_string()));
    }
    if user_id.len() > MAX_USER_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "user_id".to_string(),
            max: MAX_USER_ID_LENGTH,
            actual: user_id.len(),
        });
    }
    Ok(())
}

/// Validate an RFC 3339 UTC timestamp of the form `YYYY-MM-DDTHH:MM:SSZ`.
///
/// Only the shape is checked; the store compares these strings
/// lexicographically, so a fixed UTC layout is required.
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 20
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[13] == b':'
        && bytes[16] == b':'
        && bytes[19] == b'Z'
        && bytes
            .iter()
            .enumerate()
            .filter(|(i, _)| ![4, 7, 10, 13, 16, 19].contains(i))
            .all(|(_, b)| b.is_ascii_digit());

    if shaped {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field: "remind_at".to_string(),
            reason: format!("expected YYYY-MM-DDTHH:MM:SSZ, got '{}'", value),
        })
    }
}

/// Validate an intent tag.
pub fn validate_intent(intent: &str) -> Result<(), ValidationError> {
    if INTENTS.contains(&intent) {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field: "intent".to_string(),
            reason: format!("must be one of {:?}", INTENTS),
        })
    }
}
