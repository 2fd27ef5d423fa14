//! Reminder store trait and implementations.

use async_trait::async_trait;
use database::{reminder, Database, NewReminder};
use tracing::info;

use crate::error::OrchestratorError;
use crate::intent::ReminderIntent;

/// Persists reminders for authenticated users.
///
/// Abstracted so turns can run against SQLite, a test double, or nothing.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Save a reminder and return its id.
    async fn create_reminder(
        &self,
        user_id: &str,
        reminder: &NewReminder,
    ) -> Result<i64, OrchestratorError>;
}

/// Reminder store backed by the SQLite database.
#[derive(Debug, Clone)]
pub struct DatabaseReminderStore {
    database: Database,
}

impl DatabaseReminderStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl ReminderStore for DatabaseReminderStore {
    async fn create_reminder(
        &self,
        user_id: &str,
        new_reminder: &NewReminder,
    ) -> Result<i64, OrchestratorError> {
        let id = reminder::create_reminder(self.database.pool(), user_id, new_reminder).await?;
        info!(reminder_id = id, intent = %new_reminder.intent, "Reminder saved");
        Ok(id)
    }
}

impl From<&ReminderIntent> for NewReminder {
    fn from(intent: &ReminderIntent) -> Self {
        NewReminder {
            title: intent.title.clone(),
            remind_at: intent.remind_at_rfc3339(),
            notify: intent.notify,
            alarm: intent.alarm,
            voice: intent.voice,
            intent: intent.kind.as_str().to_string(),
        }
    }
}
