//! # FreightDB Testkit
//!
//! Test utilities for FreightDB.
//!
//! This crate provides:
//! - Test fixtures and repository helpers
//! - A fault-injecting state backend for partial-failure tests
//! - Property-based test generators using proptest
//! - A reference model of repository semantics
//! - Fuzz testing harnesses
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use freightdb_testkit::prelude::*;
//! use freightdb_core::builtin;
//!
//! with_temp_repo(builtin::load(), |repo| {
//!     repo.create("L1", &load_fields("ACME", "2024-03-01")).unwrap();
//!     assert_eq!(repo.ids().unwrap(), vec!["L1"]);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
