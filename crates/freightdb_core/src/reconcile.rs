//! Index reconciliation.
//!
//! Records and their index entries are written by separate backend calls,
//! so a failure between the two leaves them out of step. Reconciliation
//! walks every key the backend holds and compares what it finds with the
//! index.

use crate::error::CoreResult;
use crate::record::Record;
use crate::repository::RecordRepository;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Entries in the index as found, duplicates included.
    pub indexed: usize,
    /// Stored records of this schema.
    pub records: usize,
    /// Records with no index entry, in identifier order.
    pub orphans: Vec<String>,
    /// Index entries with no record of this schema.
    pub dangling: Vec<String>,
    /// Identifiers indexed more than once.
    pub duplicates: Vec<String>,
    /// Non-reserved keys whose values are not records of this schema.
    pub foreign: Vec<String>,
    /// Whether the index was rewritten.
    pub repaired: bool,
}

impl ReconcileReport {
    /// Whether index and records agree.
    pub fn is_consistent(&self) -> bool {
        self.orphans.is_empty() && self.dangling.is_empty() && self.duplicates.is_empty()
    }
}

pub(crate) fn run(repo: &RecordRepository, repair: bool) -> CoreResult<ReconcileReport> {
    let backend = repo.backend();
    let schema = repo.schema();
    let keys = backend.keys()?;
    let ids = repo.index().load()?;

    let mut stored = BTreeSet::new();
    let mut foreign = Vec::new();
    for key in keys {
        if repo.config().is_reserved(&key) {
            continue;
        }
        let is_record = match backend.get(&key)? {
            Some(bytes) if !bytes.is_empty() => {
                matches!(Record::decode(schema, &bytes), Ok(record) if record.id() == key)
            }
            _ => false,
        };
        if is_record {
            stored.insert(key);
        } else {
            foreign.push(key);
        }
    }

    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    let mut dangling = Vec::new();
    for id in &ids {
        if !seen.insert(id.as_str()) {
            duplicates.insert(id.clone());
        } else if !stored.contains(id) {
            dangling.push(id.clone());
        }
    }
    let orphans: Vec<String> = stored
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect();

    let mut report = ReconcileReport {
        indexed: ids.len(),
        records: stored.len(),
        orphans,
        dangling,
        duplicates: duplicates.into_iter().collect(),
        foreign,
        repaired: false,
    };

    for id in &report.orphans {
        warn!(schema = schema.name(), %id, "record missing from index");
    }
    for id in &report.dangling {
        warn!(schema = schema.name(), %id, "index entry without record");
    }

    if repair && !report.is_consistent() {
        report.repaired = repo.index().modify(|current| {
            let mut kept = HashSet::new();
            let before = current.clone();
            current.retain(|id| stored.contains(id) && kept.insert(id.clone()));
            for id in &stored {
                if !kept.contains(id) {
                    current.push(id.clone());
                }
            }
            *current != before
        })?;
        info!(
            schema = schema.name(),
            orphans = report.orphans.len(),
            dangling = report.dangling.len(),
            duplicates = report.duplicates.len(),
            "repaired index"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use crate::config::RepositoryConfig;
    use crate::error::CoreError;
    use crate::record::{FieldMap, Record};
    use crate::repository::RecordRepository;
    use crate::schema::builtin;
    use freightdb_state::{InMemoryState, StateBackend, StateError};
    use std::sync::Arc;

    fn load_fields() -> FieldMap {
        [("carrier", "ACME"), ("shipDate", "2024-03-01")]
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn setup() -> (RecordRepository, Arc<InMemoryState>) {
        let state = Arc::new(InMemoryState::new());
        let repo =
            RecordRepository::open(state.clone(), builtin::load(), RepositoryConfig::default())
                .unwrap();
        (repo, state)
    }

    #[test]
    fn consistent_repository() {
        let (repo, _) = setup();
        repo.create("L1", &load_fields()).unwrap();
        repo.create("L2", &load_fields()).unwrap();

        let report = repo.reconcile(false).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.indexed, 2);
        assert_eq!(report.records, 2);
        assert!(report.foreign.is_empty());
    }

    #[test]
    fn finds_and_repairs_inconsistencies() {
        let (repo, state) = setup();
        repo.create("L1", &load_fields()).unwrap();
        repo.create("L2", &load_fields()).unwrap();

        // orphan: record written without its index entry
        let orphan = Record::new(repo.schema(), "L0", &load_fields()).unwrap();
        state.put("L0", &orphan.encode(repo.schema()).unwrap()).unwrap();
        // dangling and duplicate entries
        repo.index()
            .save(&["L1".into(), "gone".into(), "L2".into(), "L1".into()])
            .unwrap();
        // a value of another kind
        state.put("misc", b"\x61x").unwrap();

        let report = repo.reconcile(false).unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.orphans, vec!["L0"]);
        assert_eq!(report.dangling, vec!["gone"]);
        assert_eq!(report.duplicates, vec!["L1"]);
        assert_eq!(report.foreign, vec!["misc"]);
        assert!(!report.repaired);

        let report = repo.reconcile(true).unwrap();
        assert!(report.repaired);
        assert_eq!(repo.ids().unwrap(), vec!["L1", "L2", "L0"]);
        assert!(repo.reconcile(false).unwrap().is_consistent());
    }

    #[test]
    fn records_of_other_schemas_are_foreign() {
        let state: Arc<dyn StateBackend> = Arc::new(InMemoryState::new());
        let loads =
            RecordRepository::open(Arc::clone(&state), builtin::load(), RepositoryConfig::default())
                .unwrap();
        let contracts =
            RecordRepository::open(state, builtin::contract(), RepositoryConfig::default())
                .unwrap();
        loads.create("L1", &load_fields()).unwrap();

        let report = contracts.reconcile(true).unwrap();
        assert_eq!(report.foreign, vec!["L1"]);
        assert!(report.is_consistent());
        assert!(!report.repaired);
        assert!(contracts.ids().unwrap().is_empty());
    }

    #[test]
    fn backend_without_key_listing() {
        struct Opaque(InMemoryState);
        impl StateBackend for Opaque {
            fn get(&self, key: &str) -> freightdb_state::StateResult<Option<Vec<u8>>> {
                self.0.get(key)
            }
            fn put(&self, key: &str, value: &[u8]) -> freightdb_state::StateResult<()> {
                self.0.put(key, value)
            }
            fn delete(&self, key: &str) -> freightdb_state::StateResult<()> {
                self.0.delete(key)
            }
        }

        let repo = RecordRepository::open(
            Arc::new(Opaque(InMemoryState::new())),
            builtin::load(),
            RepositoryConfig::default(),
        )
        .unwrap();
        let err = repo.reconcile(false).unwrap_err();
        assert!(matches!(err, CoreError::State(StateError::Unsupported(_))));
    }
}
