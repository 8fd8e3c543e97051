//! The record index.
//!
//! Each repository keeps the identifiers of its records, in insertion
//! order, as a canonical CBOR array of text stored under the schema's
//! reserved index key. The index is the only multi-record structure in the
//! state, so every mutation of it is a read-modify-write. When the backend
//! supports version-checked writes, the mutation is retried until it lands
//! on an unchanged index; otherwise the last writer wins.

use crate::error::{CoreError, CoreResult};
use freightdb_codec::{from_cbor, to_canonical_cbor, Value};
use freightdb_state::StateBackend;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads and mutates the index of one repository.
pub struct IndexManager {
    backend: Arc<dyn StateBackend>,
    key: String,
    retry_limit: u32,
}

impl IndexManager {
    /// Creates a manager for the index stored under `key`.
    pub fn new(backend: Arc<dyn StateBackend>, key: impl Into<String>, retry_limit: u32) -> Self {
        Self {
            backend,
            key: key.into(),
            retry_limit: retry_limit.max(1),
        }
    }

    /// The index key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the index key holds a value.
    pub fn exists(&self) -> CoreResult<bool> {
        Ok(self.backend.get(&self.key)?.is_some())
    }

    /// Loads the index. An absent or zero-length index reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPayload`] if the stored value is not an
    /// array of text.
    pub fn load(&self) -> CoreResult<Vec<String>> {
        match self.backend.get(&self.key)? {
            Some(bytes) => decode_index(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the index wholesale.
    pub fn save(&self, ids: &[String]) -> CoreResult<()> {
        self.backend.put(&self.key, &encode_index(ids)?)?;
        Ok(())
    }

    /// Whether `id` has an index entry.
    pub fn contains(&self, id: &str) -> CoreResult<bool> {
        Ok(self.load()?.iter().any(|entry| entry == id))
    }

    /// Writes an empty index if none exists. Returns whether it wrote.
    pub fn create_if_absent(&self) -> CoreResult<bool> {
        let empty = encode_index(&[])?;
        if self.backend.supports_compare_and_put() {
            return Ok(self.backend.compare_and_put(&self.key, None, &empty)?);
        }
        if self.exists()? {
            return Ok(false);
        }
        self.backend.put(&self.key, &empty)?;
        Ok(true)
    }

    /// Appends `id` unless it is already indexed. Returns whether it was
    /// appended.
    pub fn add(&self, id: &str) -> CoreResult<bool> {
        self.modify(|ids| {
            if ids.iter().any(|entry| entry == id) {
                return false;
            }
            ids.push(id.to_string());
            true
        })
    }

    /// Removes every entry equal to `id`, keeping the order of the rest.
    /// Returns whether anything was removed; nothing is written otherwise.
    pub fn remove(&self, id: &str) -> CoreResult<bool> {
        self.modify(|ids| {
            let before = ids.len();
            ids.retain(|entry| entry != id);
            ids.len() != before
        })
    }

    /// Applies `change` to the current index and writes the result if
    /// `change` reports a modification.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexContention`] when a version-checked write
    /// fails on every attempt.
    pub fn modify<F>(&self, mut change: F) -> CoreResult<bool>
    where
        F: FnMut(&mut Vec<String>) -> bool,
    {
        if !self.backend.supports_compare_and_put() {
            let mut ids = self.load()?;
            if !change(&mut ids) {
                return Ok(false);
            }
            self.save(&ids)?;
            return Ok(true);
        }

        for attempt in 1..=self.retry_limit {
            let current = self.backend.get(&self.key)?;
            let mut ids = match current.as_deref() {
                Some(bytes) => decode_index(bytes)?,
                None => Vec::new(),
            };
            if !change(&mut ids) {
                return Ok(false);
            }
            let encoded = encode_index(&ids)?;
            if self
                .backend
                .compare_and_put(&self.key, current.as_deref(), &encoded)?
            {
                return Ok(true);
            }
            debug!(key = %self.key, attempt, "index changed underneath update, retrying");
        }

        warn!(key = %self.key, attempts = self.retry_limit, "giving up on contended index");
        Err(CoreError::IndexContention {
            key: self.key.clone(),
            attempts: self.retry_limit,
        })
    }
}

/// Encodes identifiers as a canonical CBOR array of text.
pub fn encode_index(ids: &[String]) -> CoreResult<Vec<u8>> {
    Ok(to_canonical_cbor(&Value::text_array(ids))?)
}

/// Decodes an index payload. Zero bytes decode as the empty index.
pub fn decode_index(bytes: &[u8]) -> CoreResult<Vec<String>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let items = from_cbor(bytes)?
        .into_array()
        .ok_or_else(|| CoreError::invalid_payload("index is not an array"))?;
    items
        .into_iter()
        .map(|item| {
            item.into_text()
                .ok_or_else(|| CoreError::invalid_payload("index entry is not text"))
        })
        .collect()
}
