//! State backend trait definition.

use crate::error::{StateError, StateResult};

/// A ledger state backend for FreightDB.
///
/// State backends are **opaque key/value stores**. They map string keys to
/// byte values and know nothing about records, indexes or payload encodings.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last written with `put` for that key
/// - `get` returns `None` for a key that was never written or was deleted
/// - a single `put`, `delete` or `compare_and_put` is atomic
/// - backends must be `Send + Sync`; writes go through `&self`
///
/// # Implementors
///
/// - [`super::InMemoryState`] - For testing
/// - [`super::FileState`] - For persistent state
pub trait StateBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve the read.
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected or cannot be persisted.
    fn put(&self, key: &str, value: &[u8]) -> StateResult<()>;

    /// Removes `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be persisted.
    fn delete(&self, key: &str) -> StateResult<()>;

    /// Whether [`StateBackend::compare_and_put`] is implemented.
    fn supports_compare_and_put(&self) -> bool {
        false
    }

    /// Writes `value` under `key` only if the stored value equals `expected`.
    ///
    /// `expected == None` means the key must be absent. Returns `false`
    /// without writing when the stored value differs.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Unsupported`] unless the backend overrides it.
    fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> StateResult<bool> {
        let _ = (key, expected, value);
        Err(StateError::Unsupported("compare_and_put"))
    }

    /// Lists every key currently stored, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Unsupported`] unless the backend overrides it.
    fn keys(&self) -> StateResult<Vec<String>> {
        Err(StateError::Unsupported("keys"))
    }
}

impl<B: StateBackend + ?Sized> StateBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StateResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> StateResult<()> {
        (**self).delete(key)
    }

    fn supports_compare_and_put(&self) -> bool {
        (**self).supports_compare_and_put()
    }

    fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> StateResult<bool> {
        (**self).compare_and_put(key, expected, value)
    }

    fn keys(&self) -> StateResult<Vec<String>> {
        (**self).keys()
    }
}
