//! Typed collection API.
//!
//! Provides `Collection<T>` for type-safe record storage, with the mapping
//! between Rust values and schema records supplied by the `RecordType`
//! trait.

mod codec;
mod typed;

pub use codec::RecordType;
pub use typed::Collection;
