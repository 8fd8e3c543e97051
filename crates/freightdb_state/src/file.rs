//! File-backed state backend for persistent state.

use crate::backend::StateBackend;
use crate::error::{StateError, StateResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes at the start of a state file.
const MAGIC: &[u8; 4] = b"FDBS";

/// Current state file format version.
const FORMAT_VERSION: u16 = 1;

/// A file-backed state backend.
///
/// The whole key space is held in memory and written out as a snapshot
/// after every mutation. Snapshots are written to a sibling temporary file,
/// synced, then renamed over the state file, so a crash leaves either the
/// previous or the new snapshot on disk.
///
/// # File Format
///
/// ```text
/// magic "FDBS" | version u16 | count u32 | count x (key_len u32 | key | value_len u32 | value)
/// ```
///
/// All integers are little-endian.
///
/// # Locking
///
/// An exclusive advisory lock on `<path>.lock` is held for the lifetime of
/// the backend. A second `open` on the same path fails with
/// [`StateError::Locked`].
///
/// # Example
///
/// ```no_run
/// use freightdb_state::{StateBackend, FileState};
/// use std::path::Path;
///
/// let state = FileState::open(Path::new("loads.state")).unwrap();
/// state.put("L1", b"persistent").unwrap();
/// ```
#[derive(Debug)]
pub struct FileState {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    _lock: File,
}

impl FileState {
    /// Opens or creates a state file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is held elsewhere, the file cannot be
    /// read, or its contents are not a valid snapshot.
    pub fn open(path: &Path) -> StateResult<Self> {
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path(path))?;
        lock.try_lock_exclusive().map_err(|_| StateError::Locked)?;

        let entries = if path.exists() {
            let mut bytes = Vec::new();
            File::open(path)?.read_to_end(&mut bytes)?;
            decode_snapshot(&bytes)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            _lock: lock,
        })
    }

    /// Opens or creates a state file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StateResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
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

    fn persist(&self, entries: &BTreeMap<String, Vec<u8>>) -> StateResult<()> {
        let bytes = encode_snapshot(entries)?;
        let tmp = sibling_path(&self.path, ".tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Applies `change` to the entries and persists; the in-memory map is
    /// restored if the snapshot cannot be written.
    fn mutate(&self, key: &str, change: Option<&[u8]>) -> StateResult<()> {
        let mut entries = self.entries.write();
        let previous = match change {
            Some(value) => entries.insert(key.to_string(), value.to_vec()),
            None => entries.remove(key),
        };

        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

impl StateBackend for FileState {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StateResult<()> {
        self.mutate(key, Some(value))
    }

    fn delete(&self, key: &str) -> StateResult<()> {
        if !self.entries.read().contains_key(key) {
            return Ok(());
        }
        self.mutate(key, None)
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
        let previous = entries.insert(key.to_string(), value.to_vec());
        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(true)
    }

    fn keys(&self) -> StateResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    sibling_path(path, ".lock")
}

/// `path` with `suffix` appended to its full file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn encode_snapshot(entries: &BTreeMap<String, Vec<u8>>) -> StateResult<Vec<u8>> {
    let mut out = Vec::with_capacity(10);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&encode_len(entries.len())?);
    for (key, value) in entries {
        out.extend_from_slice(&encode_len(key.len())?);
        out.extend_from_slice(key.as_bytes());
        out.extend_from_slice(&encode_len(value.len())?);
        out.extend_from_slice(value);
    }
    Ok(out)
}

fn encode_len(len: usize) -> StateResult<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| StateError::Corrupted(format!("length {len} exceeds u32")))
}

fn decode_snapshot(bytes: &[u8]) -> StateResult<BTreeMap<String, Vec<u8>>> {
    let mut reader = SnapshotReader { bytes, pos: 0 };

    if reader.take(4)? != MAGIC {
        return Err(StateError::Corrupted("bad magic".into()));
    }
    let version = u16::from_le_bytes([reader.byte()?, reader.byte()?]);
    if version != FORMAT_VERSION {
        return Err(StateError::Corrupted(format!(
            "unsupported format version {version}"
        )));
    }

    let count = reader.len()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key_len = reader.len()?;
        let key = std::str::from_utf8(reader.take(key_len)?)
            .map_err(|_| StateError::Corrupted("key is not UTF-8".into()))?
            .to_string();
        let value_len = reader.len()?;
        let value = reader.take(value_len)?.to_vec();
        if entries.insert(key, value).is_some() {
            return Err(StateError::Corrupted("duplicate key".into()));
        }
    }

    if reader.pos != bytes.len() {
        return Err(StateError::Corrupted("trailing bytes after snapshot".into()));
    }
    Ok(entries)
}

struct SnapshotReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SnapshotReader<'a> {
    fn take(&mut self, len: usize) -> StateResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| StateError::Corrupted("truncated snapshot".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> StateResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn len(&mut self) -> StateResult<usize> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
    }
}
