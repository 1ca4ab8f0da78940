// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SQLite document store backend.
//!
//! Announcements and readings land in separate tables, each row holding the
//! full JSON document. The schema stays flexible: fields are never projected
//! into columns, so sensors may announce or report anything.

use crate::decoder::DecodedRecord;
use crate::store::{DocumentStore, StoredDocument};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Table holding device announcements.
const SENSORS_TABLE: &str = "sensors";

/// Table holding sensor readings.
const READINGS_TABLE: &str = "readings";

/// SQLite-backed document store.
///
/// Thread-safe via internal Mutex (SQLite Connection is not Sync).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sensors (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     document TEXT NOT NULL,
///     received_at_ns INTEGER NOT NULL
/// );
/// CREATE TABLE readings (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     document TEXT NOT NULL,
///     received_at_ns INTEGER NOT NULL
/// );
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store with a file-based database.
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database at {}", path))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to create in-memory SQLite database")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        for table in [SENSORS_TABLE, READINGS_TABLE] {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        document TEXT NOT NULL,
                        received_at_ns INTEGER NOT NULL
                    )",
                    table
                ),
                [],
            )?;

            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_received_at ON {}(received_at_ns)",
                    table, table
                ),
                [],
            )?;
        }

        Ok(())
    }

    fn insert(&self, table: &str, record: &DecodedRecord) -> Result<()> {
        let document = serde_json::to_string(record).context("Failed to serialize document")?;
        let received_at_ns = now_ns();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (document, received_at_ns) VALUES (?1, ?2)",
                table
            ),
            params![document, received_at_ns as i64],
        )?;

        Ok(())
    }

    fn load(&self, table: &str) -> Result<Vec<StoredDocument>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT document, received_at_ns FROM {}
             ORDER BY received_at_ns ASC, id ASC",
            table
        ))?;

        let docs = stmt
            .query_map([], Self::row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    fn table_count(&self, table: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;

        Ok(count as usize)
    }

    /// Helper function to map a row to a StoredDocument.
    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<StoredDocument> {
        let text: String = row.get(0)?;
        let document = serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(StoredDocument {
            document,
            received_at_ns: row.get::<_, i64>(1)? as u64,
        })
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

impl DocumentStore for SqliteStore {
    fn persist_announcement(&self, record: &DecodedRecord) -> Result<()> {
        self.insert(SENSORS_TABLE, record)
    }

    fn persist_reading(&self, record: &DecodedRecord) -> Result<()> {
        self.insert(READINGS_TABLE, record)
    }

    fn announcements(&self) -> Result<Vec<StoredDocument>> {
        self.load(SENSORS_TABLE)
    }

    fn readings(&self) -> Result<Vec<StoredDocument>> {
        self.load(READINGS_TABLE)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.table_count(SENSORS_TABLE)? + self.table_count(READINGS_TABLE)?)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(&format!("DELETE FROM {}", SENSORS_TABLE), [])?;
        conn.execute(&format!("DELETE FROM {}", READINGS_TABLE), [])?;
        Ok(())
    }
}
