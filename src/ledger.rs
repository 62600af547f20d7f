//! # Key-Value Ledger Capability
//!
//! The consumed storage interface the rule catalog operates against.
//! Backends guarantee per-key atomic upserts and key-ordered range scans;
//! commit, consensus and conflict detection live below this seam and are
//! not re-modeled here.

use thiserror::Error;

/// Errors surfaced by ledger backends.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger read failed: {0}")]
    Read(String),

    #[error("ledger write failed: {0}")]
    Write(String),

    #[error("range scan failed: {0}")]
    Scan(String),
}

/// Ordered cursor over `(key, value)` pairs produced by a range scan.
///
/// Single-pass: `next` yields entries in ascending key order until the
/// range is exhausted. `close` releases backend-side iteration state and
/// must be called on every exit path; `next` after `close` is an error.
pub trait ScanCursor {
    /// Yields the next entry, or `None` once the range is exhausted.
    fn next(&mut self) -> Result<Option<(String, Vec<u8>)>, LedgerError>;

    /// Releases the cursor. Idempotent.
    fn close(&mut self) -> Result<(), LedgerError>;
}

/// Versioned key-value store of record.
///
/// Each call is one atomic unit of work; conflicting writes to the same
/// key are serialized by the backend's transaction discipline, not by
/// callers.
pub trait KeyValueLedger {
    /// Fetches the raw value at `key`. `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Atomic upsert of `value` at `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    /// Opens an ordered cursor over keys in `[start_key, end_key_exclusive)`.
    fn range_scan(
        &self,
        start_key: &str,
        end_key_exclusive: &str,
    ) -> Result<Box<dyn ScanCursor>, LedgerError>;
}
