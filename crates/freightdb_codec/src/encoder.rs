//! Canonical CBOR encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::{cmp_text_keys, Value};

/// CBOR major type for text strings.
const MAJOR_TEXT: u8 = 3;
/// CBOR major type for arrays.
const MAJOR_ARRAY: u8 = 4;
/// CBOR major type for maps.
const MAJOR_MAP: u8 = 5;

/// Encode a value to canonical CBOR bytes.
///
/// This function produces deterministic output following the canonical
/// CBOR rules of RFC 8949 Section 4.2.1:
/// - Map keys are sorted by their encoded form (length-first, then bytewise)
/// - Lengths use the shortest possible encoding
/// - No indefinite-length encoding
///
/// # Errors
///
/// Returns an error if a map contains the same key twice.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder.
///
/// Besides encoding whole [`Value`]s, the encoder exposes the container
/// headers and a raw append so callers can splice already-encoded items
/// (for example stored records) into a larger payload without decoding
/// them first.
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => {
                self.buffer.push(0xf6);
                Ok(())
            }
            Value::Text(s) => {
                self.text(s);
                Ok(())
            }
            Value::Array(items) => {
                self.array_header(items.len());
                for item in items {
                    self.encode(item)?;
                }
                Ok(())
            }
            Value::Map(pairs) => self.encode_map(pairs),
        }
    }

    /// Write a text string.
    pub fn text(&mut self, text: &str) {
        self.header(MAJOR_TEXT, text.len() as u64);
        self.buffer.extend_from_slice(text.as_bytes());
    }

    /// Write a definite-length array header for `len` items.
    pub fn array_header(&mut self, len: usize) {
        self.header(MAJOR_ARRAY, len as u64);
    }

    /// Write a definite-length map header for `len` pairs.
    pub fn map_header(&mut self, len: usize) {
        self.header(MAJOR_MAP, len as u64);
    }

    /// Append bytes that already hold exactly one encoded CBOR item.
    ///
    /// The caller is responsible for the bytes being canonical.
    pub fn raw(&mut self, encoded: &[u8]) {
        self.buffer.extend_from_slice(encoded);
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[allow(clippy::cast_possible_truncation)]
    fn header(&mut self, major_type: u8, value: u64) {
        let mt = major_type << 5;

        if value < 24 {
            self.buffer.push(mt | (value as u8));
        } else if u8::try_from(value).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(value as u8);
        } else if u16::try_from(value).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if u32::try_from(value).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn encode_map(&mut self, pairs: &[(String, Value)]) -> CodecResult<()> {
        let mut sorted: Vec<&(String, Value)> = pairs.iter().collect();
        sorted.sort_by(|a, b| cmp_text_keys(&a.0, &b.0));

        if let Some(dup) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(CodecError::encoding_failed(format!(
                "duplicate map key {:?}",
                dup[0].0
            )));
        }

        self.map_header(sorted.len());
        for (key, value) in sorted {
            self.text(key);
            self.encode(value)?;
        }
        Ok(())
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_null() {
        assert_eq!(to_canonical_cbor(&Value::Null).unwrap(), vec![0xf6]);
    }

    #[test]
    fn encode_text() {
        assert_eq!(to_canonical_cbor(&Value::from("")).unwrap(), vec![0x60]);
        assert_eq!(
            to_canonical_cbor(&Value::from("a")).unwrap(),
            vec![0x61, b'a']
        );
        assert_eq!(
            to_canonical_cbor(&Value::from("hello")).unwrap(),
            vec![0x65, b'h', b'e', b'l', b'l', b'o']
        );
    }

    #[test]
    fn encode_long_text_uses_length_byte() {
        let text = "x".repeat(24);
        let bytes = to_canonical_cbor(&Value::from(text.as_str())).unwrap();
        assert_eq!(&bytes[..2], &[0x78, 24]);
        assert_eq!(bytes.len(), 26);

        let text = "y".repeat(300);
        let bytes = to_canonical_cbor(&Value::from(text.as_str())).unwrap();
        assert_eq!(&bytes[..3], &[0x79, 0x01, 0x2c]);
    }

    #[test]
    fn encode_array() {
        assert_eq!(to_canonical_cbor(&Value::Array(vec![])).unwrap(), vec![0x80]);
        assert_eq!(
            to_canonical_cbor(&Value::text_array(["L1", "L2"])).unwrap(),
            vec![0x82, 0x62, b'L', b'1', 0x62, b'L', b'2']
        );
    }

    #[test]
    fn encode_map_sorted() {
        // Keys should be sorted: length first, then bytewise
        let map = Value::Map(vec![
            ("bb".into(), Value::from("2")),
            ("a".into(), Value::from("1")),
        ]);
        let bytes = to_canonical_cbor(&map).unwrap();

        assert_eq!(
            bytes,
            vec![0xa2, 0x61, b'a', 0x61, b'1', 0x62, b'b', b'b', 0x61, b'2']
        );
    }

    #[test]
    fn encode_map_rejects_duplicate_keys() {
        let map = Value::Map(vec![
            ("a".into(), Value::from("1")),
            ("a".into(), Value::from("2")),
        ]);
        assert!(matches!(
            to_canonical_cbor(&map),
            Err(CodecError::EncodingFailed { .. })
        ));
    }

    #[test]
    fn deterministic_encoding() {
        // Same logical map with different insertion orders should produce same bytes
        let map1 = Value::Map(vec![
            ("origin".into(), Value::from("Memphis")),
            ("carrier".into(), Value::from("ACME")),
        ]);
        let map2 = Value::Map(vec![
            ("carrier".into(), Value::from("ACME")),
            ("origin".into(), Value::from("Memphis")),
        ]);

        assert_eq!(
            to_canonical_cbor(&map1).unwrap(),
            to_canonical_cbor(&map2).unwrap()
        );
    }

    #[test]
    fn spliced_payload_matches_full_encoding() {
        let record = Value::map(vec![("id".into(), Value::from("L1"))]);
        let record_bytes = to_canonical_cbor(&record).unwrap();

        let mut spliced = CanonicalEncoder::new();
        spliced.map_header(1);
        spliced.text("items");
        spliced.array_header(1);
        spliced.raw(&record_bytes);

        let full = Value::map(vec![("items".into(), Value::Array(vec![record]))]);
        assert_eq!(spliced.into_bytes(), to_canonical_cbor(&full).unwrap());
    }
}
