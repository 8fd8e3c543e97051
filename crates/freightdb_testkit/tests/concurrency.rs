//! Concurrent access to one repository.

use freightdb_core::{builtin, RecordRepository, RepositoryConfig};
use freightdb_state::InMemoryState;
use freightdb_testkit::{stress_concurrent_churn, stress_concurrent_creates, StressConfig};
use std::collections::HashSet;
use std::sync::Arc;

fn shared_repo() -> Arc<RecordRepository> {
    let config = RepositoryConfig::default().index_retry_limit(1_000);
    Arc::new(
        RecordRepository::open(Arc::new(InMemoryState::new()), builtin::load(), config).unwrap(),
    )
}

#[test]
fn concurrent_creates_lose_no_index_entries() {
    let repo = shared_repo();
    let config = StressConfig {
        operations: 400,
        threads: 4,
        record_count: 0,
    };
    let result = stress_concurrent_creates(Arc::clone(&repo), &config);
    assert_eq!(result.successful_ops, 400);

    let ids = repo.ids().unwrap();
    assert_eq!(ids.len(), 400);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 400);
    assert!(repo.reconcile(false).unwrap().is_consistent());
}

#[test]
fn concurrent_churn_never_duplicates_entries() {
    let repo = shared_repo();
    let config = StressConfig {
        operations: 600,
        threads: 4,
        record_count: 10,
    };
    stress_concurrent_churn(Arc::clone(&repo), &config);

    let ids = repo.ids().unwrap();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());

    repo.reconcile(true).unwrap();
    assert!(repo.reconcile(false).unwrap().is_consistent());
}
