//! # FreightDB Codec
//!
//! Canonical CBOR encoding/decoding for FreightDB payloads.
//!
//! Records, the record index and listings are all stored and returned as
//! canonical CBOR, so that:
//! - Identical records produce identical bytes
//! - `encode(decode(bytes)) == bytes` for every payload FreightDB writes
//! - Stored record bytes can be spliced into a listing unchanged
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are sorted by key (length-first, then bytewise)
//! - Lengths use the shortest encoding
//! - Only text, arrays, text-keyed maps and null are accepted
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use freightdb_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let index = Value::text_array(["L1", "L2"]);
//! let bytes = to_canonical_cbor(&index).unwrap();
//!
//! let decoded = from_cbor(&bytes).unwrap();
//! assert_eq!(index, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;
