//! Record schemas.
//!
//! A [`RecordSchema`] describes one record variant: the name of its
//! identifier field, its ordered list of text fields, the reserved key that
//! holds its index, and the top-level field name of its listing payload.
//! The ordering of the fields is significant: positional invocations
//! (see [`crate::Router`]) bind arguments to fields in schema order.
//!
//! Two variants ship built in, [`builtin::contract`] and [`builtin::load`].

pub mod builtin;
mod field;

pub use field::FieldDef;

use crate::error::{CoreError, CoreResult};
use crate::record::FieldMap;
use std::collections::HashSet;

/// Description of one record variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    id_field: String,
    index_key: String,
    listing_field: String,
    fields: Vec<FieldDef>,
}

impl RecordSchema {
    /// Starts building a schema with the given variant name.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Variant name, e.g. `contract`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the identifier field inside record payloads.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Reserved state key holding the index.
    pub fn index_key(&self) -> &str {
        &self.index_key
    }

    /// Top-level field of the listing payload.
    pub fn listing_field(&self) -> &str {
        &self.listing_field
    }

    /// Fields in positional order, identifier excluded.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Number of leading positional arguments (identifier included) a
    /// positional create must supply: everything up to the last mandatory
    /// field.
    pub fn required_positions(&self) -> usize {
        1 + self
            .fields
            .iter()
            .rposition(FieldDef::is_mandatory)
            .map_or(0, |pos| pos + 1)
    }

    /// A field map holding every field with an empty value.
    pub fn blank_fields(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|f| (f.name().to_string(), String::new()))
            .collect()
    }

    /// Validates the field values supplied for a new record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] when a name is not a field of
    /// this schema or a mandatory field is missing or empty.
    pub fn check_create(&self, values: &FieldMap) -> CoreResult<()> {
        self.check_known(values)?;
        for field in self.fields.iter().filter(|f| f.is_mandatory()) {
            if values.get(field.name()).map_or(true, String::is_empty) {
                return Err(CoreError::invalid_argument(format!(
                    "{} {} is mandatory",
                    self.name,
                    field.name()
                )));
            }
        }
        Ok(())
    }

    /// Validates a patch against the stored field values.
    ///
    /// A locked field may appear in the patch only with its stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for unknown names or an
    /// attempt to change a locked field.
    pub fn check_patch(&self, current: &FieldMap, patch: &FieldMap) -> CoreResult<()> {
        self.check_known(patch)?;
        for (name, value) in patch {
            let locked = self.field(name).is_some_and(|f| !f.is_updatable());
            if locked && current.get(name) != Some(value) {
                return Err(CoreError::invalid_argument(format!(
                    "{} {name} cannot be changed after creation",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn check_known(&self, values: &FieldMap) -> CoreResult<()> {
        for name in values.keys() {
            if name == &self.id_field {
                return Err(CoreError::invalid_argument(format!(
                    "{name} is the identifier and cannot be set as a field"
                )));
            }
            if self.field(name).is_none() {
                return Err(CoreError::invalid_argument(format!(
                    "{} has no field {name:?}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    id_field: String,
    index_key: Option<String>,
    listing_field: Option<String>,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: "id".to_string(),
            index_key: None,
            listing_field: None,
            fields: Vec::new(),
        }
    }

    /// Sets the identifier field name. Defaults to `id`.
    #[must_use]
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Sets the index key. Defaults to `_<name>index`.
    #[must_use]
    pub fn index_key(mut self, key: impl Into<String>) -> Self {
        self.index_key = Some(key.into());
        self
    }

    /// Sets the listing field. Defaults to `<name>s`.
    #[must_use]
    pub fn listing_field(mut self, name: impl Into<String>) -> Self {
        self.listing_field = Some(name.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] for empty names, a schema with
    /// no fields, or duplicate field names.
    pub fn build(self) -> CoreResult<RecordSchema> {
        if self.name.is_empty() {
            return Err(CoreError::invalid_schema("schema name is empty"));
        }
        if self.id_field.is_empty() {
            return Err(CoreError::invalid_schema("identifier field name is empty"));
        }
        if self.fields.is_empty() {
            return Err(CoreError::invalid_schema(format!(
                "{} declares no fields",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        seen.insert(self.id_field.as_str());
        for field in &self.fields {
            if field.name().is_empty() {
                return Err(CoreError::invalid_schema("field name is empty"));
            }
            if !seen.insert(field.name()) {
                return Err(CoreError::invalid_schema(format!(
                    "duplicate field {:?}",
                    field.name()
                )));
            }
        }

        let index_key = self
            .index_key
            .unwrap_or_else(|| format!("_{}index", self.name));
        let listing_field = self
            .listing_field
            .unwrap_or_else(|| format!("{}s", self.name));
        if index_key.is_empty() || listing_field.is_empty() {
            return Err(CoreError::invalid_schema(
                "index key and listing field must not be empty",
            ));
        }

        Ok(RecordSchema {
            name: self.name,
            id_field: self.id_field,
            index_key,
            listing_field,
            fields: self.fields,
        })
    }
}
