//! Storage layer for the stoppage report.
//!
//! Provides a durable [`Mirror`] for the report store using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A [`SqliteMirror`] is therefore owned by exactly one report store, which in
//! turn is shared behind the store's own mutex.
//!
//! # Schema
//!
//! A single key/value table holds the serialized report:
//!
//! - `key`: mirror key (e.g. `stoppage_report`)
//! - `value`: the JSON array of records, written whole on every mutation
//! - `updated_at`: ISO 8601 timestamp of the last write (e.g. `2025-01-27T12:00:00.000Z`)

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use sr_core::{MIRROR_KEY, Mirror, MirrorError};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for key {key}: {timestamp}")]
    TimestampParse {
        key: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<DbError> for MirrorError {
    fn from(e: DbError) -> Self {
        Self::new(e)
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Mirror table: whole-value snapshots keyed by name
            -- updated_at: ISO 8601 format (e.g., '2025-01-27T12:00:00.000Z')
            CREATE TABLE IF NOT EXISTS mirror (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Reads the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM mirror WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.put_at(key, value, Utc::now())
    }

    fn put_at(&self, key: &str, value: &str, now: DateTime<Utc>) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO mirror (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, format_timestamp(now)],
        )?;
        Ok(())
    }

    /// When `key` was last written, if ever.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, DbError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT updated_at FROM mirror WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|timestamp| parse_timestamp(&timestamp, key))
            .transpose()
    }
}

fn parse_timestamp(timestamp: &str, key: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            key: key.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Report store mirror backed by a SQLite database.
pub struct SqliteMirror {
    db: Database,
    key: String,
}

impl SqliteMirror {
    /// Mirrors under the default report key.
    pub fn new(db: Database) -> Self {
        Self::with_key(db, MIRROR_KEY)
    }

    pub fn with_key(db: Database, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    /// Opens (or creates) the database at `path` and mirrors into it.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let db = Database::open(path)?;
        tracing::debug!(path = %path.display(), "opened report database");
        Ok(Self::new(db))
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }
}

impl Mirror for SqliteMirror {
    fn load(&self) -> Result<Option<String>, MirrorError> {
        Ok(self.db.get(&self.key)?)
    }

    fn save(&self, contents: &str) -> Result<(), MirrorError> {
        self.db.put(&self.key, contents)?;
        Ok(())
    }
}
