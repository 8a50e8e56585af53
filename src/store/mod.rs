pub mod filter_set;
pub mod subscribers;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub use filter_set::FilterSet;

/// Persistence operations the command dispatcher relies on.
///
/// `add_filter` and `remove_filter` return `Ok(false)` when no subscriber
/// exists for the chat; errors are reserved for storage failures.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Create the subscriber if the chat id is unseen. Never touches an
    /// existing record. Returns `true` when a row was created.
    async fn upsert_subscriber(
        &self,
        chat_id: &str,
        user_name: &str,
        language_code: Option<&str>,
    ) -> Result<bool>;

    async fn list_filters(&self, chat_id: &str) -> Result<FilterSet>;

    async fn add_filter(&self, chat_id: &str, value: &str) -> Result<bool>;

    async fn remove_filter(&self, chat_id: &str, value: &str) -> Result<bool>;
}

/// Thread-safe SQLite subscriber store
#[derive(Clone)]
pub struct SubscriberStore {
    conn: Arc<Mutex<Connection>>,
}

impl SubscriberStore {
    /// Open or create the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // journal_mode PRAGMA always returns the resulting mode, so use query_row
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        // Run migrations on the raw connection before wrapping in Mutex.
        Self::run_migrations(&conn)?;

        info!("Subscriber store initialized at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL UNIQUE,
                user_name TEXT NOT NULL,
                language_code TEXT,
                -- JSON array of filter strings, NULL when the subscriber has none
                filters TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )
        .context("Failed to create subscribers table")?;
        Ok(())
    }
}
