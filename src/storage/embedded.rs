//! Embedded storage tier — a rusqlite key/value table.
//!
//! Stands in for the transactional store browser-embedded hosts provide.
//! Each save runs as one statement, so a partially-applied write cannot be
//! observed by a later load.

use crate::error::Result;
use crate::storage::StorageTier;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

pub struct EmbeddedTier {
    conn: Mutex<Connection>,
}

impl EmbeddedTier {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS modules (
                key        TEXT PRIMARY KEY,
                payload    TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl StorageTier for EmbeddedTier {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let conn = self.conn.lock().expect("embedded store lock poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO modules (key, payload, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, data, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().expect("embedded store lock poisoned");
        let row: Option<String> = conn
            .query_row(
                "SELECT payload FROM modules WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match row {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().expect("embedded store lock poisoned");
        conn.execute("DELETE FROM modules WHERE key = ?1", params![key])?;
        Ok(())
    }
}
