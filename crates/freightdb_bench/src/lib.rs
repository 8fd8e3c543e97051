//! Benchmark utilities.

use freightdb_core::{builtin, FieldMap, RecordRepository};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates a random load identifier.
pub fn random_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("L-{suffix}")
}

/// Generates a batch of distinct identifiers.
pub fn generate_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("L{i:06}")).collect()
}

/// Load fields with every column filled.
pub fn load_fields() -> FieldMap {
    let mut rng = rand::thread_rng();
    [
        ("carrier", "ACME Freight".to_string()),
        ("shipDate", "2024-03-01".to_string()),
        ("deliveryDate", "2024-03-04".to_string()),
        ("status", "in-transit".to_string()),
        ("equipmentType", "53ft dry van".to_string()),
        ("amountBilled", rng.gen_range(500..5000).to_string()),
        ("amountPaid", "0".to_string()),
        ("mileage", rng.gen_range(50..3000).to_string()),
        ("weight", rng.gen_range(1000..45000).to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Opens an in-memory load repository holding `count` records.
pub fn populated_loads(count: usize) -> RecordRepository {
    let repo = RecordRepository::open_in_memory(builtin::load()).unwrap();
    repo.initialize().unwrap();
    let fields = load_fields();
    for id in generate_ids(count) {
        repo.create(&id, &fields).unwrap();
    }
    repo
}
