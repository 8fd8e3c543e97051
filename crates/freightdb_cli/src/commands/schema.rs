//! Schema command implementation.

use super::OutputFormat;
use freightdb_core::RecordSchema;
use serde::Serialize;

/// Serializable description of a schema.
#[derive(Debug, Serialize)]
pub struct SchemaInfo<'a> {
    /// Variant name.
    pub name: &'a str,
    /// Identifier field.
    pub id_field: &'a str,
    /// Index key.
    pub index_key: &'a str,
    /// Listing field.
    pub listing_field: &'a str,
    /// Fields in positional order.
    pub fields: Vec<FieldInfo<'a>>,
}

/// Serializable description of one field.
#[derive(Debug, Serialize)]
pub struct FieldInfo<'a> {
    /// Field name.
    pub name: &'a str,
    /// Required at creation.
    pub mandatory: bool,
    /// Changeable after creation.
    pub updatable: bool,
}

impl<'a> From<&'a RecordSchema> for SchemaInfo<'a> {
    fn from(schema: &'a RecordSchema) -> Self {
        Self {
            name: schema.name(),
            id_field: schema.id_field(),
            index_key: schema.index_key(),
            listing_field: schema.listing_field(),
            fields: schema
                .fields()
                .iter()
                .map(|f| FieldInfo {
                    name: f.name(),
                    mandatory: f.is_mandatory(),
                    updatable: f.is_updatable(),
                })
                .collect(),
        }
    }
}

/// Runs the schema command.
pub fn run(schema: &RecordSchema, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let info = SchemaInfo::from(schema);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => {
            println!("Schema:        {}", info.name);
            println!("Identifier:    {}", info.id_field);
            println!("Index key:     {}", info.index_key);
            println!("Listing field: {}", info.listing_field);
            println!();
            println!("  #  field");
            for (pos, field) in info.fields.iter().enumerate() {
                let mut flags = Vec::new();
                if field.mandatory {
                    flags.push("mandatory");
                }
                if !field.updatable {
                    flags.push("locked");
                }
                println!("  {:<2} {} {}", pos + 1, field.name, flags.join(", "));
            }
        }
    }
    Ok(())
}
