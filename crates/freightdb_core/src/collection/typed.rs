//! Typed collection implementation.

use crate::collection::codec::RecordType;
use crate::config::RepositoryConfig;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::repository::RecordRepository;
use freightdb_state::StateBackend;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed collection of records.
///
/// `Collection<T>` provides type-safe access to records of type `T`, where
/// `T` implements `RecordType`. It validates values at the boundary and
/// stores them through a [`RecordRepository`] opened with `T::schema()`.
///
/// # Example
///
/// ```rust
/// use freightdb_core::{Collection, Load, RepositoryConfig};
/// use freightdb_state::InMemoryState;
/// use std::sync::Arc;
///
/// let loads: Collection<Load> =
///     Collection::open(Arc::new(InMemoryState::new()), RepositoryConfig::default()).unwrap();
///
/// let mut load = Load::new("L1", "ACME", "2024-03-01");
/// loads.insert(&load).unwrap();
///
/// load.status = "delivered".into();
/// loads.update(&load).unwrap();
///
/// assert_eq!(loads.get("L1").unwrap().unwrap().status, "delivered");
/// ```
pub struct Collection<T: RecordType> {
    /// The repository holding the records.
    repository: RecordRepository,
    /// Type marker.
    _marker: PhantomData<T>,
}

impl<T: RecordType> Collection<T> {
    /// Opens a typed collection over `backend`.
    pub fn open(backend: Arc<dyn StateBackend>, config: RepositoryConfig) -> CoreResult<Self> {
        let repository = RecordRepository::open(backend, T::schema(), config)?;
        Ok(Self {
            repository,
            _marker: PhantomData,
        })
    }

    /// Wraps an existing repository.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] if the repository was opened with
    /// a schema other than `T::schema()`.
    pub fn from_repository(repository: RecordRepository) -> CoreResult<Self> {
        if repository.schema() != &T::schema() {
            return Err(CoreError::invalid_schema(format!(
                "repository holds {} records",
                repository.schema().name()
            )));
        }
        Ok(Self {
            repository,
            _marker: PhantomData,
        })
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &RecordRepository {
        &self.repository
    }

    /// Returns the schema name.
    pub fn name(&self) -> &str {
        self.repository.schema().name()
    }

    /// Inserts a new record.
    ///
    /// Fails with [`CoreError::AlreadyExists`] if the identifier is taken.
    pub fn insert(&self, value: &T) -> CoreResult<()> {
        self.repository.create(value.record_id(), &value.to_fields())?;
        Ok(())
    }

    /// Gets a record by identifier.
    ///
    /// Returns `None` if the record doesn't exist.
    pub fn get(&self, id: &str) -> CoreResult<Option<T>> {
        match self.repository.get(id) {
            Ok(record) => Ok(Some(T::from_record(record)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Writes every field of `value` over the stored record.
    ///
    /// Locked fields must still hold their stored values.
    pub fn update(&self, value: &T) -> CoreResult<()> {
        self.repository
            .update(value.record_id(), &value.to_fields())?;
        Ok(())
    }

    /// Deletes a record by identifier.
    pub fn delete(&self, id: &str) -> CoreResult<()> {
        self.repository.delete(id)?;
        Ok(())
    }

    /// Checks if a record exists.
    pub fn exists(&self, id: &str) -> CoreResult<bool> {
        self.repository.exists(id)
    }

    /// Returns the number of indexed records.
    pub fn count(&self) -> CoreResult<usize> {
        Ok(self.repository.ids()?.len())
    }

    /// Returns all records in index order.
    pub fn list(&self) -> CoreResult<Vec<T>> {
        self.repository
            .records()?
            .into_iter()
            .map(T::from_record)
            .collect()
    }
}
