//! In-memory ledger backend.
//!
//! Entries live in a key-ordered map behind an RwLock. Range scans copy
//! the bounded window into a [`SnapshotCursor`], so readers and writers
//! are never blocked by an open cursor.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::SnapshotCursor;
use crate::ledger::{KeyValueLedger, LedgerError, ScanCursor};

/// In-process reference backend. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    /// Map of key -> raw value bytes
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns true if `key` holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl KeyValueLedger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn range_scan(
        &self,
        start_key: &str,
        end_key_exclusive: &str,
    ) -> Result<Box<dyn ScanCursor>, LedgerError> {
        let entries = self.entries.read();
        let window: Vec<(String, Vec<u8>)> = entries
            .range(start_key.to_string()..end_key_exclusive.to_string())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Box::new(SnapshotCursor::new(window)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let ledger = MemoryLedger::new();

        ledger.put("RULE0", b"payload").unwrap();

        assert!(ledger.contains("RULE0"));
        assert_eq!(ledger.get("RULE0").unwrap().unwrap(), b"payload");
    }

    #[test]
    fn test_get_missing_returns_none() {
        let ledger = MemoryLedger::new();

        assert!(ledger.get("RULE0").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let ledger = MemoryLedger::new();

        ledger.put("RULE0", b"first").unwrap();
        ledger.put("RULE0", b"second").unwrap();

        assert_eq!(ledger.get("RULE0").unwrap().unwrap(), b"second");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_range_scan_is_ordered() {
        let ledger = MemoryLedger::new();

        ledger.put("RULE3", b"c").unwrap();
        ledger.put("RULE1", b"a").unwrap();
        ledger.put("RULE2", b"b").unwrap();

        let mut cursor = ledger.range_scan("RULE0", "RULE9999").unwrap();
        let mut keys = Vec::new();
        while let Some((key, _)) = cursor.next().unwrap() {
            keys.push(key);
        }
        cursor.close().unwrap();

        assert_eq!(keys, vec!["RULE1", "RULE2", "RULE3"]);
    }

    #[test]
    fn test_range_scan_bounds_are_half_open() {
        let ledger = MemoryLedger::new();

        ledger.put("RULE0", b"in").unwrap();
        ledger.put("RULE5", b"in").unwrap();
        ledger.put("RULE9999", b"out").unwrap();
        ledger.put("RULEZZ", b"out").unwrap();
        ledger.put("OTHER", b"out").unwrap();

        let mut cursor = ledger.range_scan("RULE0", "RULE9999").unwrap();
        let mut keys = Vec::new();
        while let Some((key, _)) = cursor.next().unwrap() {
            keys.push(key);
        }
        cursor.close().unwrap();

        assert_eq!(keys, vec!["RULE0", "RULE5"]);
    }

    #[test]
    fn test_scan_snapshot_ignores_later_writes() {
        let ledger = MemoryLedger::new();
        ledger.put("RULE1", b"a").unwrap();

        let mut cursor = ledger.range_scan("RULE0", "RULE9999").unwrap();
        ledger.put("RULE2", b"b").unwrap();

        let mut count = 0;
        while cursor.next().unwrap().is_some() {
            count += 1;
        }
        cursor.close().unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let ledger = MemoryLedger::new();
        let mut handles = vec![];

        for thread_id in 0..4 {
            let ledger_clone = ledger.clone();
            let handle = thread::spawn(move || {
                for i in 0..10 {
                    let key = format!("RULE{}{}", thread_id, i);
                    ledger_clone.put(&key, b"payload").unwrap();
                    ledger_clone.get(&key).unwrap();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 40);
    }
}
