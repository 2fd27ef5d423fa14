//! Reminder persistence.

use sqlx::SqlitePool;

use crate::models::{NewReminder, Reminder};
use crate::validation::{validate_intent, validate_timestamp, validate_title, validate_user_id};
use crate::{DatabaseError, Result};

/// Insert a reminder and return its id.
pub async fn create_reminder(pool: &SqlitePool, user_id: &str, reminder: &NewReminder) -> Result<i64> {
    validate_user_id(user_id)?;
    validate_title(&reminder.title)?;
    validate_timestamp(&reminder.remind_at)?;
    validate_intent(&reminder.intent)?;

    let result = sqlx::query(
        r#"
        INSERT INTO reminders (user_id, title, remind_at, notify, alarm, voice, intent)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(reminder.title.trim())
    .bind(&reminder.remind_at)
    .bind(reminder.notify)
    .bind(reminder.alarm)
    .bind(reminder.voice)
    .bind(&reminder.intent)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a reminder by id.
pub async fn get_reminder(pool: &SqlitePool, id: i64) -> Result<Reminder> {
    sqlx::query_as::<_, Reminder>(
        r#"
        SELECT id, user_id, title, remind_at, notify, alarm, voice, intent, created_at
        FROM reminders
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "reminder",
        id: id.to_string(),
    })
}
