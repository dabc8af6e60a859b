//! Database connection management

use shelfmark_core::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Database connection pool
pub type DbPool = Pool<Sqlite>;

const MAX_CONNECTIONS: u32 = 10;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "shelfmark.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Creates a configuration for the given database file
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Establishes a connection pool, creating the database file if missing.
///
/// Foreign keys are enforced on every pooled connection; the join tables
/// count on cascade deletes when an entity row goes away.
pub async fn connect(config: DatabaseConfig) -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))
        .map_err(|e| AppError::database("Invalid database path", e))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to database", e))
}

/// Creates an in-memory database for testing.
///
/// Capped at one connection so every test statement sees the same
/// in-memory database.
pub async fn create_test_db() -> Result<DbPool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::database("Failed to create test database", e))?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Memory);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database("Failed to connect to test database", e))
}
