//! Record type trait for typed collections.

use crate::error::CoreResult;
use crate::record::{FieldMap, Record};
use crate::schema::RecordSchema;

/// Trait for value types stored as records of a fixed schema.
///
/// Implementors must provide:
/// - `schema()`: The schema every value of the type is stored under
/// - `record_id()`: The identifier the value is stored under
/// - `to_fields()`: The non-identifier field values
/// - `from_record()`: Reconstruction from a stored record
///
/// # Example
///
/// ```rust
/// use freightdb_core::{CoreResult, FieldDef, FieldMap, Record, RecordSchema, RecordType};
///
/// struct Pallet {
///     tag: String,
///     owner: String,
/// }
///
/// impl RecordType for Pallet {
///     fn schema() -> RecordSchema {
///         RecordSchema::builder("pallet")
///             .id_field("tag")
///             .field(FieldDef::mandatory("owner"))
///             .build()
///             .unwrap()
///     }
///
///     fn record_id(&self) -> &str {
///         &self.tag
///     }
///
///     fn to_fields(&self) -> FieldMap {
///         FieldMap::from([("owner".to_string(), self.owner.clone())])
///     }
///
///     fn from_record(record: Record) -> CoreResult<Self> {
///         let tag = record.id().to_string();
///         let mut fields = record.into_fields();
///         Ok(Pallet {
///             tag,
///             owner: fields.remove("owner").unwrap_or_default(),
///         })
///     }
/// }
/// ```
pub trait RecordType: Sized {
    /// The schema of this type.
    fn schema() -> RecordSchema;

    /// Returns the identifier the value is stored under.
    ///
    /// This ID must not change over the record's lifetime.
    fn record_id(&self) -> &str;

    /// Returns every non-identifier field value.
    fn to_fields(&self) -> FieldMap;

    /// Rebuilds a value from a stored record.
    fn from_record(record: Record) -> CoreResult<Self>;

    /// Converts the value into a record of its schema.
    fn to_record(&self) -> CoreResult<Record> {
        Record::new(&Self::schema(), self.record_id(), &self.to_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::schema::FieldDef;

    #[derive(Debug, Clone, PartialEq)]
    struct Trailer {
        plate: String,
        axles: String,
    }

    impl RecordType for Trailer {
        fn schema() -> RecordSchema {
            RecordSchema::builder("trailer")
                .id_field("plate")
                .field(FieldDef::optional("axles"))
                .build()
                .unwrap()
        }

        fn record_id(&self) -> &str {
            &self.plate
        }

        fn to_fields(&self) -> FieldMap {
            FieldMap::from([("axles".to_string(), self.axles.clone())])
        }

        fn from_record(record: Record) -> CoreResult<Self> {
            let plate = record.id().to_string();
            let axles = record
                .field("axles")
                .ok_or_else(|| CoreError::invalid_payload("missing axles"))?
                .to_string();
            Ok(Trailer { plate, axles })
        }
    }

    #[test]
    fn record_roundtrip() {
        let trailer = Trailer {
            plate: "TX-1".to_string(),
            axles: "3".to_string(),
        };

        let record = trailer.to_record().unwrap();
        assert_eq!(record.id(), "TX-1");

        let bytes = record.encode(&Trailer::schema()).unwrap();
        let decoded = Record::decode(&Trailer::schema(), &bytes).unwrap();
        assert_eq!(Trailer::from_record(decoded).unwrap(), trailer);
    }

    #[test]
    fn deterministic_encoding() {
        let trailer = Trailer {
            plate: "TX-1".to_string(),
            axles: "2".to_string(),
        };
        let schema = Trailer::schema();

        let bytes1 = trailer.to_record().unwrap().encode(&schema).unwrap();
        let bytes2 = trailer.clone().to_record().unwrap().encode(&schema).unwrap();

        assert_eq!(bytes1, bytes2);
    }
}
