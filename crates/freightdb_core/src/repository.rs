//! The record repository.

use crate::config::{EmptyEntryPolicy, RepositoryConfig};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexManager;
use crate::listing::build_listing;
use crate::reconcile::{self, ReconcileReport};
use crate::record::{FieldMap, Record};
use crate::schema::RecordSchema;
use bytes::Bytes;
use freightdb_state::{InMemoryState, StateBackend};
use std::sync::Arc;
use tracing::{debug, warn};

/// Indexed records of one schema over a shared state backend.
///
/// Each record is stored under its identifier as a canonical CBOR map. The
/// identifiers of all live records are kept, in creation order, in an
/// index stored under the schema's reserved index key. Record writes and
/// index writes are separate backend calls: a failure between them leaves
/// a record that the index does not list, which
/// [`reconcile`](Self::reconcile) can find and repair.
///
/// The repository holds no locks of its own and can be shared between
/// threads.
///
/// # Example
///
/// ```rust
/// use freightdb_core::{builtin, FieldMap, RecordRepository};
///
/// let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
///
/// let mut fields = FieldMap::new();
/// fields.insert("carrier".into(), "ACME".into());
/// fields.insert("shipDate".into(), "2024-03-01".into());
/// repo.create("L1", &fields).unwrap();
///
/// assert_eq!(repo.get("L1").unwrap().field("carrier"), Some("ACME"));
/// assert_eq!(repo.ids().unwrap(), vec!["L1"]);
/// ```
pub struct RecordRepository {
    backend: Arc<dyn StateBackend>,
    schema: RecordSchema,
    config: RepositoryConfig,
    index: IndexManager,
}

impl RecordRepository {
    /// Opens a repository over `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] if the configuration is
    /// unusable or the schema's index key lies outside the reserved prefix.
    pub fn open(
        backend: Arc<dyn StateBackend>,
        schema: RecordSchema,
        config: RepositoryConfig,
    ) -> CoreResult<Self> {
        config.validate()?;
        if !config.is_reserved(schema.index_key()) {
            return Err(CoreError::invalid_schema(format!(
                "index key {:?} must start with the reserved prefix {:?}",
                schema.index_key(),
                config.reserved_prefix
            )));
        }

        let index = IndexManager::new(
            Arc::clone(&backend),
            schema.index_key(),
            config.index_retry_limit,
        );
        debug!(schema = schema.name(), index_key = schema.index_key(), "opened repository");
        Ok(Self {
            backend,
            schema,
            config,
            index,
        })
    }

    /// Opens a repository over a fresh in-memory backend with the default
    /// configuration.
    pub fn open_in_memory(schema: RecordSchema) -> CoreResult<Self> {
        Self::open(Arc::new(InMemoryState::new()), schema, RepositoryConfig::default())
    }

    /// The schema of the stored records.
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// The repository configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The index manager.
    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    /// The shared backend.
    pub fn backend(&self) -> &Arc<dyn StateBackend> {
        &self.backend
    }

    /// Writes an empty index if none exists yet.
    ///
    /// An existing index is left as it is, so repeated initialization never
    /// loses entries. Returns whether an index was written.
    pub fn initialize(&self) -> CoreResult<bool> {
        let created = self.index.create_if_absent()?;
        debug!(schema = self.schema.name(), created, "initialized index");
        Ok(created)
    }

    /// Creates a record and appends its identifier to the index.
    ///
    /// All validation happens before the first backend write.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidArgument`] for an empty or reserved identifier,
    ///   an empty mandatory field or an unknown field name
    /// - [`CoreError::AlreadyExists`] if a record is stored under `id`
    /// - a backend-class error if a read or write fails; when only the index
    ///   write fails the record stays stored but unindexed
    pub fn create(&self, id: &str, fields: &FieldMap) -> CoreResult<Record> {
        self.check_id(id)?;
        self.schema.check_create(fields)?;
        let record = Record::new(&self.schema, id, fields)?;
        let payload = record.encode(&self.schema)?;

        if self.fetch(id)?.is_some() {
            return Err(CoreError::already_exists(id));
        }

        self.backend.put(id, &payload)?;
        if let Err(err) = self.index.add(id) {
            warn!(schema = self.schema.name(), %id, error = %err, "record stored but not indexed");
            return Err(err);
        }

        debug!(schema = self.schema.name(), %id, "created record");
        Ok(record)
    }

    /// Returns the stored payload of `id` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if nothing is stored under `id`.
    pub fn read(&self, id: &str) -> CoreResult<Bytes> {
        self.check_id(id)?;
        match self.backend.get(id)? {
            Some(bytes) if !bytes.is_empty() => Ok(Bytes::from(bytes)),
            _ => Err(CoreError::not_found(id)),
        }
    }

    /// Returns the decoded record stored under `id`.
    pub fn get(&self, id: &str) -> CoreResult<Record> {
        self.check_id(id)?;
        self.fetch(id)?.ok_or_else(|| CoreError::not_found(id))
    }

    /// Whether a record is stored under `id`.
    pub fn exists(&self, id: &str) -> CoreResult<bool> {
        self.check_id(id)?;
        Ok(self.fetch(id)?.is_some())
    }

    /// Overwrites the fields named in `patch` on an existing record.
    ///
    /// Fields not named keep their stored values, the identifier never
    /// changes and the index is not touched.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record is stored under `id`
    /// - [`CoreError::InvalidArgument`] if `patch` names the identifier, an
    ///   unknown field, or changes a locked field
    pub fn update(&self, id: &str, patch: &FieldMap) -> CoreResult<Record> {
        self.check_id(id)?;
        let mut record = self.fetch(id)?.ok_or_else(|| CoreError::not_found(id))?;
        self.schema.check_patch(record.fields(), patch)?;

        record.apply(patch);
        self.backend.put(id, &record.encode(&self.schema)?)?;

        debug!(schema = self.schema.name(), %id, fields = patch.len(), "updated record");
        Ok(record)
    }

    /// Deletes the record under `id` and its index entry.
    ///
    /// Deleting an identifier that was never stored or indexed succeeds.
    /// Returns whether an index entry was removed.
    ///
    /// # Errors
    ///
    /// Fails with a backend-class error, and deletes nothing, if `id` holds
    /// a value that is not a record of this schema, such as a record of
    /// another schema sharing the backend.
    pub fn delete(&self, id: &str) -> CoreResult<bool> {
        self.check_id(id)?;
        self.fetch(id)?;
        self.backend.delete(id)?;
        let unindexed = self.index.remove(id)?;
        debug!(schema = self.schema.name(), %id, unindexed, "deleted record");
        Ok(unindexed)
    }

    /// Identifiers in index order.
    pub fn ids(&self) -> CoreResult<Vec<String>> {
        self.index.load()
    }

    /// Builds the listing payload of every indexed record, in index order.
    ///
    /// Any backend failure aborts the listing. Indexed identifiers without a
    /// stored record are handled per [`RepositoryConfig::empty_entries`].
    pub fn list_all(&self) -> CoreResult<Bytes> {
        let ids = self.index.load()?;
        build_listing(
            self.backend.as_ref(),
            &self.schema,
            &ids,
            self.config.empty_entries,
        )
    }

    /// Decoded records in index order.
    pub fn records(&self) -> CoreResult<Vec<Record>> {
        let ids = self.index.load()?;
        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.fetch(id)? {
                Some(record) => records.push(record),
                None if self.config.empty_entries == EmptyEntryPolicy::Skip => {
                    warn!(schema = self.schema.name(), %id, "skipping indexed id without a record");
                }
                None => {
                    return Err(CoreError::invalid_payload(format!(
                        "indexed {} {id} has no record",
                        self.schema.name()
                    )))
                }
            }
        }
        Ok(records)
    }

    /// Compares the index against the keys present in the backend and,
    /// with `repair`, rewrites the index to match.
    ///
    /// # Errors
    ///
    /// Fails with a state error if the backend cannot enumerate its keys.
    pub fn reconcile(&self, repair: bool) -> CoreResult<ReconcileReport> {
        reconcile::run(self, repair)
    }

    pub(crate) fn check_id(&self, id: &str) -> CoreResult<()> {
        if id.is_empty() {
            return Err(CoreError::invalid_argument(format!(
                "{} is empty",
                self.schema.id_field()
            )));
        }
        if self.config.is_reserved(id) {
            return Err(CoreError::invalid_argument(format!(
                "{id:?} uses the reserved prefix {:?}",
                self.config.reserved_prefix
            )));
        }
        Ok(())
    }

    /// Loads and decodes the record under `id`. Absent and zero-length values
    /// read as no record.
    pub(crate) fn fetch(&self, id: &str) -> CoreResult<Option<Record>> {
        let Some(bytes) = self.backend.get(id)? else {
            return Ok(None);
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Record::decode_stored(&self.schema, id, &bytes).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::listing::decode_listing;
    use crate::schema::builtin;

    fn values(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn contract_fields(carrier: &str) -> FieldMap {
        values(&[("carrier", carrier), ("origin", "Memphis"), ("destination", "Dallas")])
    }

    fn load_fields(carrier: &str) -> FieldMap {
        values(&[("carrier", carrier), ("shipDate", "2024-03-01")])
    }

    fn repo_with_state(schema: RecordSchema) -> (RecordRepository, Arc<InMemoryState>) {
        let state = Arc::new(InMemoryState::new());
        let repo = RecordRepository::open(state.clone(), schema, RepositoryConfig::default()).unwrap();
        (repo, state)
    }

    #[test]
    fn create_then_read() {
        let repo = RecordRepository::open_in_memory(builtin::contract()).unwrap();
        let created = repo.create("C-1", &contract_fields("ACME")).unwrap();

        let bytes = repo.read("C-1").unwrap();
        let decoded = Record::decode(repo.schema(), &bytes).unwrap();
        assert_eq!(decoded, created);
        assert_eq!(decoded.field("origin"), Some("Memphis"));
        assert_eq!(decoded.field("service"), Some(""));
        assert_eq!(repo.ids().unwrap(), vec!["C-1"]);
    }

    #[test]
    fn duplicate_create_changes_nothing() {
        let (repo, state) = repo_with_state(builtin::load());
        repo.create("L1", &load_fields("X")).unwrap();
        let before = state.snapshot();

        let err = repo.create("L1", &load_fields("Y")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(state.snapshot(), before);
        assert_eq!(repo.get("L1").unwrap().field("carrier"), Some("X"));
        assert_eq!(repo.ids().unwrap(), vec!["L1"]);
    }

    #[test]
    fn delete_keeps_other_entries() {
        let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
        repo.create("A", &load_fields("ACME")).unwrap();
        repo.create("B", &load_fields("Globex")).unwrap();
        assert!(repo.delete("B").unwrap());

        assert_eq!(repo.ids().unwrap(), vec!["A"]);
        let listed = decode_listing(repo.schema(), &repo.list_all().unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), "A");
    }

    #[test]
    fn delete_of_first_entry_removes_only_that_entry() {
        let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
        for id in ["A", "B", "C"] {
            repo.create(id, &load_fields("ACME")).unwrap();
        }
        repo.delete("B").unwrap();
        assert_eq!(repo.ids().unwrap(), vec!["A", "C"]);
        repo.delete("A").unwrap();
        assert_eq!(repo.ids().unwrap(), vec!["C"]);
    }

    #[test]
    fn delete_of_unknown_id_succeeds() {
        let (repo, state) = repo_with_state(builtin::load());
        repo.create("A", &load_fields("ACME")).unwrap();
        assert!(!repo.delete("never").unwrap());
        assert_eq!(repo.ids().unwrap(), vec!["A"]);
        assert!(state.get("A").unwrap().is_some());
    }

    #[test]
    fn update_of_missing_record_is_not_found() {
        let (repo, state) = repo_with_state(builtin::contract());
        let writes = state.write_count();
        let err = repo.update("ZZZ", &values(&[("service", "LTL")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(state.write_count(), writes);
        assert!(state.get("ZZZ").unwrap().is_none());
    }

    #[test]
    fn update_merges_and_keeps_identifier() {
        let repo = RecordRepository::open_in_memory(builtin::contract()).unwrap();
        repo.create("C-1", &contract_fields("ACME")).unwrap();
        let ids_before = repo.ids().unwrap();

        let updated = repo
            .update("C-1", &values(&[("service", "LTL"), ("baseRate", "1.75")]))
            .unwrap();
        assert_eq!(updated.id(), "C-1");
        assert_eq!(updated.field("service"), Some("LTL"));
        assert_eq!(updated.field("carrier"), Some("ACME"));
        assert_eq!(updated.field("destination"), Some("Dallas"));
        assert_eq!(repo.get("C-1").unwrap(), updated);
        assert_eq!(repo.ids().unwrap(), ids_before);
    }

    #[test]
    fn update_rejects_bad_patches() {
        let (repo, state) = repo_with_state(builtin::load());
        repo.create("L1", &load_fields("ACME")).unwrap();
        let before = state.snapshot();

        for patch in [
            values(&[("carrier", "Globex")]),
            values(&[("name", "L2")]),
            values(&[("colour", "red")]),
        ] {
            let err = repo.update("L1", &patch).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(state.snapshot(), before);

        // restating the stored carrier is allowed
        repo.update("L1", &values(&[("carrier", "ACME"), ("status", "delivered")]))
            .unwrap();
        assert_eq!(repo.get("L1").unwrap().field("status"), Some("delivered"));
    }

    #[test]
    fn empty_mandatory_field_writes_nothing() {
        let (repo, state) = repo_with_state(builtin::contract());
        let err = repo
            .create("C-1", &values(&[("carrier", ""), ("origin", "Memphis")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(state.is_empty());
        assert_eq!(state.write_count(), 0);
    }

    #[test]
    fn identifiers_are_validated() {
        let (repo, state) = repo_with_state(builtin::contract());
        for id in ["", "_contractindex", "_other"] {
            assert_eq!(
                repo.create(id, &contract_fields("ACME")).unwrap_err().kind(),
                ErrorKind::InvalidArgument
            );
            assert_eq!(repo.read(id).unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(repo.delete(id).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(state.write_count(), 0);
    }

    #[test]
    fn index_key_must_be_reserved() {
        let schema = RecordSchema::builder("pallet")
            .index_key("palletindex")
            .field(crate::schema::FieldDef::optional("owner"))
            .build()
            .unwrap();
        let err = RecordRepository::open(
            Arc::new(InMemoryState::new()),
            schema,
            RepositoryConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CoreError::InvalidSchema { .. }));
    }

    #[test]
    fn read_of_missing_record_is_not_found() {
        let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
        assert_eq!(repo.read("nope").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(repo.get("nope").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!repo.exists("nope").unwrap());
    }

    #[test]
    fn initialize_is_idempotent() {
        let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
        assert!(repo.initialize().unwrap());
        repo.create("L1", &load_fields("ACME")).unwrap();
        assert!(!repo.initialize().unwrap());
        assert_eq!(repo.ids().unwrap(), vec!["L1"]);
    }

    #[test]
    fn list_all_on_empty_repository() {
        let repo = RecordRepository::open_in_memory(builtin::contract()).unwrap();
        let listed = decode_listing(repo.schema(), &repo.list_all().unwrap()).unwrap();
        assert!(listed.is_empty());
        assert!(repo.records().unwrap().is_empty());
    }

    #[test]
    fn records_follow_index_order() {
        let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
        for id in ["L3", "L1", "L2"] {
            repo.create(id, &load_fields("ACME")).unwrap();
        }
        let ids: Vec<_> = repo.records().unwrap().iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["L3", "L1", "L2"]);
    }

    #[test]
    fn mismatched_stored_identifier_is_reported() {
        let (repo, state) = repo_with_state(builtin::load());
        repo.create("L1", &load_fields("ACME")).unwrap();
        let payload = state.get("L1").unwrap().unwrap();
        state.put("L2", &payload).unwrap();

        assert_eq!(repo.get("L2").unwrap_err().kind(), ErrorKind::Backend);
        assert_eq!(
            repo.create("L2", &load_fields("ACME")).unwrap_err().kind(),
            ErrorKind::Backend
        );
        // raw reads do not interpret the payload
        assert_eq!(&repo.read("L2").unwrap()[..], &payload[..]);
    }

    #[test]
    fn two_schemas_share_one_backend() {
        let state: Arc<dyn StateBackend> = Arc::new(InMemoryState::new());
        let contracts =
            RecordRepository::open(Arc::clone(&state), builtin::contract(), RepositoryConfig::default())
                .unwrap();
        let loads =
            RecordRepository::open(Arc::clone(&state), builtin::load(), RepositoryConfig::default())
                .unwrap();

        contracts.create("C-1", &contract_fields("ACME")).unwrap();
        loads.create("L-1", &load_fields("ACME")).unwrap();

        assert_eq!(contracts.ids().unwrap(), vec!["C-1"]);
        assert_eq!(loads.ids().unwrap(), vec!["L-1"]);
    }

    #[test]
    fn delete_leaves_other_schema_records_alone() {
        let state: Arc<dyn StateBackend> = Arc::new(InMemoryState::new());
        let contracts =
            RecordRepository::open(Arc::clone(&state), builtin::contract(), RepositoryConfig::default())
                .unwrap();
        let loads =
            RecordRepository::open(Arc::clone(&state), builtin::load(), RepositoryConfig::default())
                .unwrap();

        let stored = contracts.create("X", &contract_fields("ACME")).unwrap();
        let err = loads.delete("X").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);

        assert_eq!(contracts.get("X").unwrap(), stored);
        assert_eq!(contracts.ids().unwrap(), vec!["X"]);
        assert!(contracts.reconcile(false).unwrap().is_consistent());

        // an absent key is still a no-op
        assert!(!loads.delete("nothing-here").unwrap());
    }

    #[test]
    fn listing_rejects_other_schema_record_under_indexed_id() {
        let state: Arc<dyn StateBackend> = Arc::new(InMemoryState::new());
        let contracts =
            RecordRepository::open(Arc::clone(&state), builtin::contract(), RepositoryConfig::default())
                .unwrap();
        let loads =
            RecordRepository::open(Arc::clone(&state), builtin::load(), RepositoryConfig::default())
                .unwrap();

        contracts.create("X", &contract_fields("ACME")).unwrap();
        // the contract index still lists X after a load overwrites the key
        state.delete("X").unwrap();
        loads.create("X", &load_fields("ACME")).unwrap();

        assert_eq!(contracts.list_all().unwrap_err().kind(), ErrorKind::Backend);
        assert_eq!(contracts.records().unwrap_err().kind(), ErrorKind::Backend);
        assert_eq!(loads.records().unwrap().len(), 1);
        assert!(decode_listing(loads.schema(), &loads.list_all().unwrap()).is_ok());
    }
}
