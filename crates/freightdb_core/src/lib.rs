//! # FreightDB Core
//!
//! Indexed record repository over a ledger state backend.
//!
//! This crate provides:
//! - Record schemas with mandatory and locked fields
//! - A repository for create, read, update and delete of records
//! - An index of live record identifiers under a reserved key
//! - Listing of every record in index order
//! - Index reconciliation for records and entries that drifted apart
//! - A router for named, positional invocations
//! - Typed collections over the built-in contract and load variants
//!
//! All payloads are canonical CBOR (see `freightdb_codec`) and all state
//! lives in a `freightdb_state::StateBackend`.
//!
//! ```rust
//! use freightdb_core::{builtin, FieldMap, RecordRepository, decode_listing};
//!
//! let repo = RecordRepository::open_in_memory(builtin::contract()).unwrap();
//! repo.initialize().unwrap();
//!
//! let mut fields = FieldMap::new();
//! fields.insert("carrier".into(), "ACME".into());
//! fields.insert("origin".into(), "Memphis".into());
//! repo.create("C-1", &fields).unwrap();
//!
//! let listing = repo.list_all().unwrap();
//! let records = decode_listing(repo.schema(), &listing).unwrap();
//! assert_eq!(records[0].id(), "C-1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod error;
mod index;
mod listing;
mod reconcile;
mod record;
mod repository;
mod router;
mod schema;
mod variants;

pub use collection::{Collection, RecordType};
pub use config::{EmptyEntryPolicy, RepositoryConfig};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use index::{decode_index, encode_index, IndexManager};
pub use listing::decode_listing;
pub use reconcile::ReconcileReport;
pub use record::{FieldMap, Record};
pub use repository::RecordRepository;
pub use router::{create_args, update_args, Operation, Router};
pub use schema::{builtin, FieldDef, RecordSchema, SchemaBuilder};
pub use variants::{Contract, Load};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
