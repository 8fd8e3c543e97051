//! In-memory state backend for testing.

use crate::backend::StateBackend;
use crate::error::StateResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory state backend.
///
/// This backend keeps every key in a hash map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral repositories that don't need persistence
///
/// It supports version-checked writes and key enumeration, and counts
/// mutating calls so tests can assert that an operation wrote nothing.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use freightdb_state::{StateBackend, InMemoryState};
///
/// let state = InMemoryState::new();
/// state.put("_index", b"[]").unwrap();
/// assert_eq!(state.len(), 1);
/// assert_eq!(state.write_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryState {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicU64,
}

impl InMemoryState {
    /// Creates a new empty in-memory state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory state with pre-existing entries.
    ///
    /// Useful for testing recovery and reconciliation scenarios.
    #[must_use]
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            writes: AtomicU64::new(0),
        }
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the number of successful `put`, `delete` and
    /// `compare_and_put` calls that changed state.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns a copy of every entry, sorted by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl StateBackend for InMemoryState {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StateResult<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, key: &str) -> StateResult<()> {
        self.entries.write().remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn supports_compare_and_put(&self) -> bool {
        true
    }

    fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> StateResult<bool> {
        let mut entries = self.entries.write();
        if entries.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn keys(&self) -> StateResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
