//! SQLite persistence for reminders.
//!
//! Reminders are the only state a turn writes. Operations are free
//! functions over a `SqlitePool`, grouped by entity.
//!
//! # Example
//!
//! ```no_run
//! use database::{reminder, Database, NewReminder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:assistant.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let new = NewReminder {
//!         title: "take medicine".to_string(),
//!         remind_at: "2026-10-19T07:30:00Z".to_string(),
//!         notify: true,
//!         alarm: false,
//!         voice: false,
//!         intent: "reminder".to_string(),
//!     };
//!     let id = reminder::create_reminder(db.pool(), "user-1", &new).await?;
//!     println!("created reminder {}", id);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod reminder;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{NewReminder, Reminder};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    /// In-memory databases need a pool size of 1 (see
    /// [`connect_with_pool_size`](Self::connect_with_pool_size)), since each
    /// connection would otherwise get its own empty database.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database (pool size: {})", pool_size);

        Ok(Self { pool })
    }

    /// Connect using `DATABASE_URL` and run migrations.
    ///
    /// Returns `Ok(None)` when the variable is unset or empty.
    pub async fn from_env() -> Result<Option<Self>> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        let db = Self::connect(&url).await?;
        db.migrate().await?;
        Ok(Some(db))
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn new_reminder(title: &str, remind_at: &str) -> NewReminder {
        NewReminder {
            title: title.to_string(),
            remind_at: remind_at.to_string(),
            notify: true,
            alarm: false,
            voice: false,
            intent: "reminder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_reminder() {
        let db = test_db().await;

        // Create
        let id = reminder::create_reminder(
            db.pool(),
            "user-1",
            &new_reminder("  call mom ", "2026-10-19T18:00:00Z"),
        )
        .await
        .unwrap();

        // Read
        let fetched = reminder::get_reminder(db.pool(), id).await.unwrap();
        assert_eq!(fetched.title, "call mom");
        assert_eq!(fetched.user_id, "user-1");
        assert!(fetched.notify);
        assert!(!fetched.alarm);

        let result = reminder::get_reminder(db.pool(), id + 1).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = test_db().await;

        let result =
            reminder::create_reminder(db.pool(), "u", &new_reminder("", "2026-10-18T08:00:00Z"))
                .await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let result =
            reminder::create_reminder(db.pool(), "u", &new_reminder("x", "tomorrow")).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        let mut bad_intent = new_reminder("x", "2026-10-18T08:00:00Z");
        bad_intent.intent = "meeting".to_string();
        let result = reminder::create_reminder(db.pool(), "u", &bad_intent).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }
}
