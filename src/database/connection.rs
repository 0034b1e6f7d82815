//! SQLite pool construction and schema initialization.
//!
//! The storage contract this crate relies on is small: atomic multi-statement
//! transactions and primary-key uniqueness. SQLite provides both; the single
//! schema migration in scope is the idempotent table creation below.

use crate::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::debug;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'pending',
        customer_name TEXT,
        customer_email TEXT,
        total_amount REAL NOT NULL DEFAULT 0,
        items TEXT NOT NULL DEFAULT '[]',
        shipping_address TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        order_id TEXT NOT NULL,
        amount REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        payment_method TEXT,
        transaction_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        event_data TEXT,
        workflow_id TEXT,
        timestamp TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_events_order_id ON events(order_id)",
];

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against the configured database file.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        Self::connect_to_path(Path::new(&config.filename), config).await
    }

    /// Open a pool against an explicit path, e.g. a per-test temp file.
    pub async fn connect_to_path(
        path: &Path,
        config: &DatabaseConfig,
    ) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(config.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        debug!(database = %path.display(), "database pool opened");
        Ok(Self { pool })
    }

    /// Create the three tables if absent. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool, sqlx::Error> {
        let (health,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
