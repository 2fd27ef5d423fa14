//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reminder {
    /// Row id.
    pub id: i64,
    /// Owner of the reminder.
    pub user_id: String,
    /// What to remind about.
    pub title: String,
    /// Target time, RFC 3339 in UTC (e.g., "2026-10-19T07:30:00Z").
    pub remind_at: String,
    /// Send a push notification.
    pub notify: bool,
    /// Ring as an alarm.
    pub alarm: bool,
    /// Deliver as a voice call.
    pub voice: bool,
    /// Intent tag ("reminder" or "alarm").
    pub intent: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields needed to create a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub title: String,
    /// Target time, RFC 3339 in UTC.
    pub remind_at: String,
    pub notify: bool,
    pub alarm: bool,
    pub voice: bool,
    pub intent: String,
}
