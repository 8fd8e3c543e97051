//! The built-in record variants.

use super::{FieldDef, RecordSchema};

/// Looks up a built-in schema by variant name.
pub fn by_name(name: &str) -> Option<RecordSchema> {
    match name {
        "contract" => Some(contract()),
        "load" => Some(load()),
        _ => None,
    }
}

/// Names of the built-in variants.
pub const NAMES: [&str; 2] = ["contract", "load"];

/// Carrier rate contracts keyed by `contractNumber`.
pub fn contract() -> RecordSchema {
    assemble(
        "contract",
        "contractNumber",
        "_contractindex",
        "contracts",
        vec![
            FieldDef::mandatory("carrier"),
            FieldDef::mandatory("origin"),
            FieldDef::optional("destination"),
            FieldDef::optional("service"),
            FieldDef::optional("equipmentType"),
            FieldDef::optional("baseRate"),
            FieldDef::optional("accessorialRate"),
            FieldDef::optional("tenderExpiry"),
        ],
    )
}

/// Shipment loads keyed by `name`. The carrier is fixed at creation.
pub fn load() -> RecordSchema {
    assemble(
        "load",
        "name",
        "_loadindex",
        "loaddetails",
        vec![
            FieldDef::mandatory("carrier").locked(),
            FieldDef::mandatory("shipDate"),
            FieldDef::optional("deliveryDate"),
            FieldDef::optional("status"),
            FieldDef::optional("equipmentType"),
            FieldDef::optional("amountBilled"),
            FieldDef::optional("amountPaid"),
            FieldDef::optional("mileage"),
            FieldDef::optional("weight"),
        ],
    )
}

fn assemble(
    name: &str,
    id_field: &str,
    index_key: &str,
    listing_field: &str,
    fields: Vec<FieldDef>,
) -> RecordSchema {
    RecordSchema {
        name: name.to_string(),
        id_field: id_field.to_string(),
        index_key: index_key.to_string(),
        listing_field: listing_field.to_string(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_layout() {
        let schema = contract();
        assert_eq!(schema.id_field(), "contractNumber");
        assert_eq!(schema.index_key(), "_contractindex");
        assert_eq!(schema.listing_field(), "contracts");
        assert_eq!(schema.fields().len(), 8);
        assert_eq!(schema.required_positions(), 3);
        assert!(schema.fields().iter().all(FieldDef::is_updatable));
    }

    #[test]
    fn load_layout() {
        let schema = load();
        assert_eq!(schema.id_field(), "name");
        assert_eq!(schema.index_key(), "_loadindex");
        assert_eq!(schema.listing_field(), "loaddetails");
        assert_eq!(schema.fields().len(), 9);
        assert_eq!(schema.required_positions(), 3);
        assert!(!schema.field("carrier").unwrap().is_updatable());
    }

    #[test]
    fn builtins_pass_builder_validation() {
        for schema in [contract(), load()] {
            let mut builder = RecordSchema::builder(schema.name())
                .id_field(schema.id_field())
                .index_key(schema.index_key())
                .listing_field(schema.listing_field());
            for field in schema.fields() {
                builder = builder.field(field.clone());
            }
            assert_eq!(builder.build().unwrap(), schema);
        }
    }

    #[test]
    fn lookup_by_name() {
        for name in NAMES {
            assert_eq!(by_name(name).unwrap().name(), name);
        }
        assert!(by_name("invoice").is_none());
    }
}
