//! Ledger backends.
//!
//! `MemoryLedger` is the in-process reference backend; `SqliteLedger`
//! persists entries to disk. Both snapshot the scanned window up front,
//! so cursors never hold backend locks while the caller iterates.

mod memory;
mod sqlite;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

use std::collections::VecDeque;

use crate::ledger::{LedgerError, ScanCursor};

/// Cursor over a range snapshot taken at scan time.
pub(crate) struct SnapshotCursor {
    entries: VecDeque<(String, Vec<u8>)>,
    closed: bool,
}

impl SnapshotCursor {
    /// Wraps rows already sorted in ascending key order.
    pub(crate) fn new(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            entries: entries.into(),
            closed: false,
        }
    }
}

impl ScanCursor for SnapshotCursor {
    fn next(&mut self) -> Result<Option<(String, Vec<u8>)>, LedgerError> {
        if self.closed {
            return Err(LedgerError::Scan("cursor is closed".to_string()));
        }
        Ok(self.entries.pop_front())
    }

    fn close(&mut self) -> Result<(), LedgerError> {
        self.closed = true;
        self.entries.clear();
        Ok(())
    }
}
