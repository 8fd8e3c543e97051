//! Fault injection for partial-failure testing.
//!
//! Records and index entries are written by separate backend calls. This
//! module provides a backend wrapper that fails chosen calls so tests can
//! observe what the repository leaves behind.
//!
//! ## Usage
//!
//! ```rust
//! use freightdb_core::{builtin, RecordRepository, RepositoryConfig};
//! use freightdb_testkit::{load_fields, FaultyState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(FaultyState::in_memory());
//! let repo = RecordRepository::open(state.clone(), builtin::load(), RepositoryConfig::default())
//!     .unwrap();
//!
//! state.fail_puts_to("_loadindex");
//! assert!(repo.create("L1", &load_fields("ACME", "2024-03-01")).is_err());
//! assert!(state.get_raw("L1").is_some());
//! ```

use freightdb_state::{InMemoryState, StateBackend, StateError, StateResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;

/// A state backend wrapper that can simulate failures.
pub struct FaultyState {
    inner: Arc<dyn StateBackend>,
    failing_keys: Mutex<HashSet<String>>,
    fail_after_writes: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    compare_and_put: AtomicBool,
    failures: AtomicUsize,
}

impl FaultyState {
    /// Creates a new faulty backend wrapping an inner backend.
    pub fn new(inner: Arc<dyn StateBackend>) -> Self {
        let compare_and_put = inner.supports_compare_and_put();
        Self {
            inner,
            failing_keys: Mutex::new(HashSet::new()),
            fail_after_writes: AtomicUsize::new(usize::MAX),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            compare_and_put: AtomicBool::new(compare_and_put),
            failures: AtomicUsize::new(0),
        }
    }

    /// Creates a faulty backend over fresh in-memory state.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryState::new()))
    }

    /// Makes every write (put, delete, version-checked put) to `key` fail.
    pub fn fail_puts_to(&self, key: &str) {
        self.failing_keys.lock().insert(key.to_string());
    }

    /// Lets `writes` more writes succeed, then fails every later write.
    pub fn fail_writes_after(&self, writes: usize) {
        let done = self.writes.load(Ordering::SeqCst);
        self.fail_after_writes
            .store(done.saturating_add(writes), Ordering::SeqCst);
    }

    /// Sets whether reads should fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Sets whether the backend advertises version-checked writes.
    pub fn set_compare_and_put(&self, enabled: bool) {
        self.compare_and_put.store(enabled, Ordering::SeqCst);
    }

    /// Clears every injected fault.
    pub fn reset(&self) {
        self.failing_keys.lock().clear();
        self.fail_after_writes.store(usize::MAX, Ordering::SeqCst);
        self.fail_reads.store(false, Ordering::SeqCst);
        self.compare_and_put
            .store(self.inner.supports_compare_and_put(), Ordering::SeqCst);
    }

    /// Number of injected failures so far.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Number of writes that reached the inner backend.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reads `key` from the inner backend, bypassing injected faults.
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).ok().flatten()
    }

    /// Writes `key` straight to the inner backend, bypassing injected
    /// faults.
    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.inner.put(key, value).expect("inner backend write failed");
    }

    fn check_write(&self, key: &str) -> StateResult<()> {
        let failing = self.failing_keys.lock().contains(key);
        if failing {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StateError::failed(key, "simulated write failure"));
        }
        if self.writes.load(Ordering::SeqCst) >= self.fail_after_writes.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StateError::failed(key, "simulated write failure after limit"));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl StateBackend for FaultyState {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(StateError::failed(key, "simulated read failure"));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StateResult<()> {
        self.check_write(key)?;
        self.inner.put(key, value)?;
        self.record_write();
        Ok(())
    }

    fn delete(&self, key: &str) -> StateResult<()> {
        self.check_write(key)?;
        self.inner.delete(key)?;
        self.record_write();
        Ok(())
    }

    fn supports_compare_and_put(&self) -> bool {
        self.compare_and_put.load(Ordering::SeqCst)
    }

    fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> StateResult<bool> {
        if !self.supports_compare_and_put() {
            return Err(StateError::Unsupported("compare_and_put"));
        }
        self.check_write(key)?;
        let written = self.inner.compare_and_put(key, expected, value)?;
        if written {
            self.record_write();
        }
        Ok(written)
    }

    fn keys(&self) -> StateResult<Vec<String>> {
        self.inner.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_key_only_affects_that_key() {
        let state = FaultyState::in_memory();
        state.fail_puts_to("bad");

        assert!(state.put("bad", b"x").is_err());
        assert!(state.put("good", b"x").is_ok());
        assert_eq!(state.failures(), 1);
        assert_eq!(state.writes(), 1);
        assert!(state.get_raw("bad").is_none());
    }

    #[test]
    fn write_limit() {
        let state = FaultyState::in_memory();
        state.fail_writes_after(2);
        state.put("a", b"1").unwrap();
        state.put("b", b"2").unwrap();
        assert!(state.put("c", b"3").is_err());
        assert!(state.delete("a").is_err());

        state.reset();
        state.put("c", b"3").unwrap();
    }

    #[test]
    fn read_failures() {
        let state = FaultyState::in_memory();
        state.put_raw("a", b"1");
        state.set_fail_reads(true);
        assert!(state.get("a").is_err());
        state.set_fail_reads(false);
        assert_eq!(state.get("a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn compare_and_put_toggle() {
        let state = FaultyState::in_memory();
        assert!(state.supports_compare_and_put());
        state.set_compare_and_put(false);
        assert!(!state.supports_compare_and_put());
        assert!(matches!(
            state.compare_and_put("k", None, b"v"),
            Err(StateError::Unsupported(_))
        ));
        state.reset();
        assert!(state.compare_and_put("k", None, b"v").unwrap());
    }

    #[test]
    fn fault_set_survives_panicking_writer() {
        let state = Arc::new(FaultyState::in_memory());
        state.fail_puts_to("bad");

        let shared = Arc::clone(&state);
        let joined = std::thread::spawn(move || {
            let _ = shared.put("bad", b"x");
            panic!("writer thread died");
        })
        .join();
        assert!(joined.is_err());

        state.fail_puts_to("worse");
        assert!(state.put("worse", b"x").is_err());
        state.reset();
        assert!(state.put("bad", b"x").is_ok());
        assert_eq!(state.failures(), 2);
    }
}
