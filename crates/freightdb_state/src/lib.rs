//! # FreightDB State
//!
//! Ledger state backend trait and implementations for FreightDB.
//!
//! This crate provides the lowest-level abstraction FreightDB reads and
//! writes through. State backends are **opaque key/value stores** - they do
//! not interpret the values they hold.
//!
//! ## Design Principles
//!
//! - Backends map string keys to byte values (get, put, delete)
//! - A single-key write is atomic; nothing spans multiple keys
//! - Version-checked writes and key enumeration are optional capabilities
//! - Must be `Send + Sync` so one backend can serve several repositories
//!
//! ## Available Backends
//!
//! - [`InMemoryState`] - For testing and ephemeral state
//! - [`FileState`] - Snapshot file persisted on every mutation
//!
//! ## Example
//!
//! ```rust
//! use freightdb_state::{StateBackend, InMemoryState};
//!
//! let state = InMemoryState::new();
//! state.put("L1", b"payload").unwrap();
//! assert_eq!(state.get("L1").unwrap().as_deref(), Some(&b"payload"[..]));
//! state.delete("L1").unwrap();
//! assert!(state.get("L1").unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StateBackend;
pub use error::{StateError, StateResult};
pub use file::FileState;
pub use memory::InMemoryState;
