//! Fuzz testing harnesses for FreightDB.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks. Each target must return normally for any
//! input; a panic is a finding.

use freightdb_codec::{from_cbor, to_canonical_cbor};
use freightdb_core::{
    builtin, decode_index, decode_listing, Record, RecordRepository, Router,
};

/// Fuzz target for CBOR decoding.
///
/// Arbitrary byte sequences either decode to a value or return an error.
pub fn fuzz_cbor_decode(data: &[u8]) {
    let _ = from_cbor(data);
}

/// Fuzz target for the canonical property.
///
/// Anything the decoder accepts is canonical, so re-encoding it must
/// reproduce the input exactly.
pub fn fuzz_cbor_roundtrip(data: &[u8]) {
    if let Ok(value) = from_cbor(data) {
        let encoded = to_canonical_cbor(&value).expect("decoded value failed to encode");
        assert_eq!(encoded, data, "accepted input is not canonical");
    }
}

/// Fuzz target for stored-payload parsing.
///
/// Record, index and listing decoders must reject malformed input without
/// panicking.
pub fn fuzz_payload_decode(data: &[u8]) {
    for schema in [builtin::contract(), builtin::load()] {
        let _ = Record::decode(&schema, data);
        let _ = decode_listing(&schema, data);
    }
    let _ = decode_index(data);
}

/// Fuzz target for routed invocations.
///
/// Splits the input into operations and arguments and runs them against a
/// fresh load repository.
pub fn fuzz_router_invocations(data: &[u8]) {
    const FUNCTIONS: [&str; 7] = [
        "init", "init_load", "write", "delete", "read", "show_all", "bogus",
    ];

    let Ok(repo) = RecordRepository::open_in_memory(builtin::load()) else {
        return;
    };
    let router = Router::new(repo);

    for chunk in data.split(|b| *b == 0xff) {
        let Some((&selector, rest)) = chunk.split_first() else {
            continue;
        };
        let function = FUNCTIONS[selector as usize % FUNCTIONS.len()];
        let args: Vec<String> = rest
            .split(|b| *b == b',')
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();
        let _ = router.invoke(function, &args[..]);
    }

    // whatever happened, the index must stay readable and duplicate-free
    let ids = router.repository().ids().expect("index unreadable after fuzzing");
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "duplicate index entries");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_inputs() {
        fuzz_cbor_decode(&[]);
        fuzz_cbor_decode(&[0xff]);
        fuzz_cbor_roundtrip(&[0x80]);
        fuzz_payload_decode(&[0xa1, 0x64, b'n', b'a', b'm', b'e', 0x61, b'x']);
        fuzz_router_invocations(b"\x01L1,ACME,2024\xff\x01L1,ACME,2024\xff\x05");
    }

    proptest! {
        #[test]
        fn fuzz_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
            fuzz_cbor_decode(&data);
            fuzz_cbor_roundtrip(&data);
            fuzz_payload_decode(&data);
        }

        #[test]
        fn fuzz_router_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
            fuzz_router_invocations(&data);
        }
    }
}
