//! Test fixtures and repository helpers.
//!
//! Provides convenience functions for setting up test repositories
//! and common field maps.

use freightdb_core::{FieldMap, RecordRepository, RecordSchema, RepositoryConfig};
use freightdb_state::{FileState, InMemoryState, StateBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A test repository with automatic cleanup.
pub struct TestRepository {
    /// The repository instance.
    pub repo: RecordRepository,
    /// The in-memory state, when memory-backed.
    memory: Option<Arc<InMemoryState>>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
    path: Option<PathBuf>,
}

impl TestRepository {
    /// Creates a repository over fresh in-memory state.
    pub fn memory(schema: RecordSchema) -> Self {
        let state = Arc::new(InMemoryState::new());
        let repo = RecordRepository::open(state.clone(), schema, RepositoryConfig::default())
            .expect("Failed to open in-memory repository");
        Self {
            repo,
            memory: Some(state),
            _temp_dir: None,
            path: None,
        }
    }

    /// Creates a repository over a state file in a temporary directory.
    pub fn file(schema: RecordSchema) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("state").join("ledger.fdb");
        let repo = open_file_repo(&path, schema);
        Self {
            repo,
            memory: None,
            _temp_dir: Some(temp_dir),
            path: Some(path),
        }
    }

    /// Creates a repository over a caller-supplied backend.
    pub fn with_backend(backend: Arc<dyn StateBackend>, schema: RecordSchema) -> Self {
        let repo = RecordRepository::open(backend, schema, RepositoryConfig::default())
            .expect("Failed to open repository");
        Self {
            repo,
            memory: None,
            _temp_dir: None,
            path: None,
        }
    }

    /// Returns the in-memory state, if memory-backed.
    pub fn memory_state(&self) -> Option<&Arc<InMemoryState>> {
        self.memory.as_ref()
    }

    /// Returns the state file path if file-based, None otherwise.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Closes and reopens a file-based repository, releasing the file lock
    /// in between.
    pub fn reopen(self) -> Self {
        let Self {
            repo,
            memory,
            _temp_dir,
            path,
        } = self;
        let schema = repo.schema().clone();
        drop(repo);

        let repo = match (&memory, &path) {
            (Some(state), _) => {
                RecordRepository::open(state.clone(), schema, RepositoryConfig::default())
                    .expect("Failed to reopen in-memory repository")
            }
            (None, Some(path)) => open_file_repo(path, schema),
            (None, None) => panic!("cannot reopen a repository over a caller-supplied backend"),
        };
        Self {
            repo,
            memory,
            _temp_dir,
            path,
        }
    }
}

fn open_file_repo(path: &Path, schema: RecordSchema) -> RecordRepository {
    let state = FileState::open_with_create_dirs(path).expect("Failed to open state file");
    RecordRepository::open(Arc::new(state), schema, RepositoryConfig::default())
        .expect("Failed to open file repository")
}

impl std::ops::Deref for TestRepository {
    type Target = RecordRepository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Runs a test with a temporary in-memory repository.
///
/// # Example
///
/// ```rust
/// use freightdb_core::builtin;
/// use freightdb_testkit::{contract_fields, with_temp_repo};
///
/// with_temp_repo(builtin::contract(), |repo| {
///     repo.create("C-1", &contract_fields("ACME", "Memphis")).unwrap();
/// });
/// ```
pub fn with_temp_repo<F, R>(schema: RecordSchema, f: F) -> R
where
    F: FnOnce(&RecordRepository) -> R,
{
    let test_repo = TestRepository::memory(schema);
    f(&test_repo.repo)
}

/// Runs a test with a temporary file-based repository.
pub fn with_file_repo<F, R>(schema: RecordSchema, f: F) -> R
where
    F: FnOnce(&RecordRepository, &Path) -> R,
{
    let test_repo = TestRepository::file(schema);
    let path = test_repo.path().map(Path::to_path_buf).unwrap_or_default();
    f(&test_repo.repo, &path)
}

/// Builds a field map from name/value pairs.
pub fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

/// Mandatory contract fields.
pub fn contract_fields(carrier: &str, origin: &str) -> FieldMap {
    fields(&[("carrier", carrier), ("origin", origin)])
}

/// Mandatory load fields.
pub fn load_fields(carrier: &str, ship_date: &str) -> FieldMap {
    fields(&[("carrier", carrier), ("shipDate", ship_date)])
}
