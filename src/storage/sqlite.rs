//! SQLite ledger backend - durable persistence for catalog entries.
//!
//! Single table keyed by entry key. SQLite's default BINARY collation on
//! TEXT gives the lexicographic ordering the range scan contract needs.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use super::SnapshotCursor;
use crate::ledger::{KeyValueLedger, LedgerError, ScanCursor};
use crate::types::now_ms;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ledger_entries (
    entry_key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    stored_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_stored_at ON ledger_entries(stored_at_ms);
";

/// SQLite-backed ledger.
#[derive(Debug)]
pub struct SqliteLedger {
    /// Database connection
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open or create the ledger database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::Read(format!("open DB failed: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| LedgerError::Write(format!("create schema failed: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Count stored entries.
    pub fn count(&self) -> Result<usize, LedgerError> {
        let conn = self.conn.lock();

        conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))
            .map_err(|e| LedgerError::Read(format!("count failed: {}", e)))
    }

    /// Remove all entries.
    pub fn clear(&self) -> Result<(), LedgerError> {
        let conn = self.conn.lock();

        conn.execute("DELETE FROM ledger_entries", [])
            .map_err(|e| LedgerError::Write(format!("clear failed: {}", e)))?;

        Ok(())
    }
}

impl KeyValueLedger for SqliteLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT value FROM ledger_entries WHERE entry_key = ?1")
            .map_err(|e| LedgerError::Read(format!("prepare failed: {}", e)))?;

        let result = stmt.query_row(params![key], |row| {
            let blob: Vec<u8> = row.get(0)?;
            Ok(blob)
        });

        match result {
            Ok(blob) => Ok(Some(blob)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::Read(format!("query failed: {}", e))),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO ledger_entries (entry_key, value, stored_at_ms) VALUES (?1, ?2, ?3)",
            params![key, value, now_ms()],
        )
        .map_err(|e| LedgerError::Write(format!("insert failed: {}", e)))?;

        Ok(())
    }

    fn range_scan(
        &self,
        start_key: &str,
        end_key_exclusive: &str,
    ) -> Result<Box<dyn ScanCursor>, LedgerError> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT entry_key, value FROM ledger_entries \
                 WHERE entry_key >= ?1 AND entry_key < ?2 ORDER BY entry_key",
            )
            .map_err(|e| LedgerError::Scan(format!("prepare failed: {}", e)))?;

        let rows = stmt
            .query_map(params![start_key, end_key_exclusive], |row| {
                let key: String = row.get(0)?;
                let value: Vec<u8> = row.get(1)?;
                Ok((key, value))
            })
            .map_err(|e| LedgerError::Scan(format!("query failed: {}", e)))?
            .collect::<Result<Vec<(String, Vec<u8>)>, _>>()
            .map_err(|e| LedgerError::Scan(format!("collect failed: {}", e)))?;

        Ok(Box::new(SnapshotCursor::new(rows)))
    }
}
