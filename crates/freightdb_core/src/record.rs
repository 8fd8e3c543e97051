//! Records and their canonical payload form.

use crate::error::{CoreError, CoreResult};
use crate::schema::RecordSchema;
use freightdb_codec::{from_cbor, to_canonical_cbor, Value};
use std::collections::BTreeMap;

/// Field values keyed by field name.
pub type FieldMap = BTreeMap<String, String>;

/// A stored record: its identifier plus one text value per schema field.
///
/// Records created through a [`RecordSchema`] always carry every field of
/// the schema; fields that were never supplied hold the empty string. The
/// payload form is a canonical CBOR map containing the identifier field and
/// all schema fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    fields: FieldMap,
}

impl Record {
    /// Builds a record from the supplied values, filling absent fields with
    /// the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `values` names a field the
    /// schema does not declare.
    pub fn new(schema: &RecordSchema, id: impl Into<String>, values: &FieldMap) -> CoreResult<Self> {
        let mut fields = schema.blank_fields();
        for (name, value) in values {
            match fields.get_mut(name) {
                Some(slot) => slot.clone_from(value),
                None => {
                    return Err(CoreError::invalid_argument(format!(
                        "{} has no field {name:?}",
                        schema.name()
                    )))
                }
            }
        }
        Ok(Self {
            id: id.into(),
            fields,
        })
    }

    /// The record identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value of one field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// All field values, identifier excluded.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Consumes the record, returning its field values.
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    /// Overwrites the fields named in `patch`. Names must already be fields
    /// of the record.
    pub(crate) fn apply(&mut self, patch: &FieldMap) {
        for (name, value) in patch {
            if let Some(slot) = self.fields.get_mut(name) {
                slot.clone_from(value);
            }
        }
    }

    /// The record as a CBOR map value.
    pub fn to_value(&self, schema: &RecordSchema) -> Value {
        let mut pairs = Vec::with_capacity(self.fields.len() + 1);
        pairs.push((schema.id_field().to_string(), Value::from(self.id.as_str())));
        pairs.extend(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), Value::from(value.as_str()))),
        );
        Value::map(pairs)
    }

    /// Reads a record back from a CBOR map value.
    ///
    /// Schema fields missing from the map are read as empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPayload`] if the value is not a map of
    /// text, lacks the identifier field or carries unknown fields.
    pub fn from_value(schema: &RecordSchema, value: Value) -> CoreResult<Self> {
        let pairs = value
            .into_map()
            .ok_or_else(|| CoreError::invalid_payload(format!("{} payload is not a map", schema.name())))?;

        let mut id = None;
        let mut fields = schema.blank_fields();
        for (name, value) in pairs {
            let text = value.into_text().ok_or_else(|| {
                CoreError::invalid_payload(format!("field {name:?} is not text"))
            })?;
            if name == schema.id_field() {
                id = Some(text);
            } else if let Some(slot) = fields.get_mut(&name) {
                *slot = text;
            } else {
                return Err(CoreError::invalid_payload(format!(
                    "{} payload has unknown field {name:?}",
                    schema.name()
                )));
            }
        }

        let id = id.ok_or_else(|| {
            CoreError::invalid_payload(format!(
                "{} payload has no {} field",
                schema.name(),
                schema.id_field()
            ))
        })?;
        Ok(Self { id, fields })
    }

    /// Encodes the record to canonical CBOR.
    pub fn encode(&self, schema: &RecordSchema) -> CoreResult<Vec<u8>> {
        Ok(to_canonical_cbor(&self.to_value(schema))?)
    }

    /// Decodes a record from CBOR bytes.
    pub fn decode(schema: &RecordSchema, bytes: &[u8]) -> CoreResult<Self> {
        Self::from_value(schema, from_cbor(bytes)?)
    }

    /// Decodes the value stored under `key`, which must be a record of
    /// `schema` carrying `key` as its identifier.
    pub(crate) fn decode_stored(schema: &RecordSchema, key: &str, bytes: &[u8]) -> CoreResult<Self> {
        let record = Self::decode(schema, bytes)?;
        if record.id() != key {
            return Err(CoreError::invalid_payload(format!(
                "key {key:?} holds {} {:?}",
                schema.name(),
                record.id()
            )));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin;
    use proptest::prelude::*;

    fn values(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn new_fills_missing_fields() {
        let schema = builtin::contract();
        let record = Record::new(&schema, "C-1", &values(&[("carrier", "ACME")])).unwrap();
        assert_eq!(record.id(), "C-1");
        assert_eq!(record.field("carrier"), Some("ACME"));
        assert_eq!(record.field("tenderExpiry"), Some(""));
        assert_eq!(record.fields().len(), schema.fields().len());
    }

    #[test]
    fn new_rejects_unknown_field() {
        let schema = builtin::contract();
        assert!(Record::new(&schema, "C-1", &values(&[("shipDate", "x")])).is_err());
    }

    #[test]
    fn payload_carries_identifier_field() {
        let schema = builtin::load();
        let record = Record::new(&schema, "L1", &values(&[("carrier", "ACME")])).unwrap();
        let bytes = record.encode(&schema).unwrap();

        let value = from_cbor(&bytes).unwrap();
        assert_eq!(value.get("name").and_then(Value::as_text), Some("L1"));
        assert_eq!(value.get("weight").and_then(Value::as_text), Some(""));
        assert_eq!(Record::decode(&schema, &bytes).unwrap(), record);
    }

    #[test]
    fn decode_tolerates_missing_fields() {
        let schema = builtin::load();
        let value = Value::map(vec![
            ("name".into(), Value::from("L7")),
            ("status".into(), Value::from("in transit")),
        ]);
        let record = Record::from_value(&schema, value).unwrap();
        assert_eq!(record.field("status"), Some("in transit"));
        assert_eq!(record.field("carrier"), Some(""));
    }

    #[test]
    fn decode_rejects_foreign_payloads() {
        let contract = builtin::contract();
        let load = builtin::load();
        let record = Record::new(&load, "L1", &FieldMap::new()).unwrap();
        let bytes = record.encode(&load).unwrap();

        let err = Record::decode(&contract, &bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPayload { .. }));

        let index = to_canonical_cbor(&Value::text_array(["L1"])).unwrap();
        assert!(matches!(
            Record::decode(&load, &index),
            Err(CoreError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn apply_overwrites_named_fields() {
        let schema = builtin::load();
        let mut record =
            Record::new(&schema, "L1", &values(&[("carrier", "ACME"), ("status", "booked")])).unwrap();
        record.apply(&values(&[("status", "delivered")]));
        assert_eq!(record.field("status"), Some("delivered"));
        assert_eq!(record.field("carrier"), Some("ACME"));
    }

    proptest! {
        #[test]
        fn payload_roundtrip(
            id in "[A-Za-z0-9-]{1,16}",
            status in ".{0,20}",
            weight in "[0-9]{0,6}",
        ) {
            let schema = builtin::load();
            let record = Record::new(
                &schema,
                id,
                &values(&[("carrier", "ACME"), ("status", &status), ("weight", &weight)]),
            )
            .unwrap();

            let bytes = record.encode(&schema).unwrap();
            let decoded = Record::decode(&schema, &bytes).unwrap();
            prop_assert_eq!(&decoded, &record);
            prop_assert_eq!(decoded.encode(&schema).unwrap(), bytes);
        }
    }
}
