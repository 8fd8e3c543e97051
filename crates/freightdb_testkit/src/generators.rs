//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use freightdb_core::{Contract, Load};
use proptest::prelude::*;

/// Strategy for generating valid record identifiers.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][A-Z0-9-]{0,11}").expect("Invalid regex")
}

/// Strategy for identifiers drawn from a small pool, so that generated
/// operation sequences revisit the same records.
pub fn pooled_id_strategy(pool: usize) -> impl Strategy<Value = String> {
    (0..pool.max(1)).prop_map(|n| format!("L{n}"))
}

/// Strategy for arbitrary (possibly empty) field values.
pub fn field_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,24}").expect("Invalid regex")
}

/// Strategy for non-empty field values.
pub fn required_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][ -~]{0,15}").expect("Invalid regex")
}

/// Strategy for generating contracts with their mandatory fields set.
pub fn contract_strategy() -> impl Strategy<Value = Contract> {
    (
        record_id_strategy(),
        required_value_strategy(),
        required_value_strategy(),
        field_value_strategy(),
        field_value_strategy(),
        field_value_strategy(),
    )
        .prop_map(
            |(id, carrier, origin, destination, service, base_rate)| Contract {
                destination,
                service,
                base_rate,
                ..Contract::new(id, carrier, origin)
            },
        )
}

/// Strategy for generating loads with their mandatory fields set.
pub fn load_strategy() -> impl Strategy<Value = Load> {
    (
        record_id_strategy(),
        required_value_strategy(),
        required_value_strategy(),
        field_value_strategy(),
        field_value_strategy(),
    )
        .prop_map(|(id, carrier, ship_date, status, weight)| Load {
            status,
            weight,
            ..Load::new(id, carrier, ship_date)
        })
}

/// One repository operation against the load schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Create a load.
    Create {
        /// Identifier.
        id: String,
        /// Carrier.
        carrier: String,
        /// Ship date.
        ship_date: String,
    },
    /// Update the status of a load.
    Update {
        /// Identifier.
        id: String,
        /// New status.
        status: String,
    },
    /// Delete a load.
    Delete {
        /// Identifier.
        id: String,
    },
}

impl Op {
    /// The identifier the operation targets.
    pub fn id(&self) -> &str {
        match self {
            Op::Create { id, .. } | Op::Update { id, .. } | Op::Delete { id } => id,
        }
    }
}

/// Strategy for a single operation over an identifier pool.
pub fn op_strategy(pool: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (pooled_id_strategy(pool), required_value_strategy(), required_value_strategy())
            .prop_map(|(id, carrier, ship_date)| Op::Create { id, carrier, ship_date }),
        1 => (pooled_id_strategy(pool), field_value_strategy())
            .prop_map(|(id, status)| Op::Update { id, status }),
        2 => pooled_id_strategy(pool).prop_map(|id| Op::Delete { id }),
    ]
}

/// Strategy for operation sequences.
pub fn ops_strategy(pool: usize, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(pool), 0..max_len)
}
