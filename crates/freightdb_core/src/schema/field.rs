//! Field definitions.

/// One named field of a record schema.
///
/// Every field is stored as text. A mandatory field must be non-empty when a
/// record is created; a locked field keeps its creation value for the
/// lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    name: String,
    mandatory: bool,
    updatable: bool,
}

impl FieldDef {
    /// An optional, updatable field.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mandatory: false,
            updatable: true,
        }
    }

    /// A field that must be non-empty at creation.
    pub fn mandatory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mandatory: true,
            updatable: true,
        }
    }

    /// Marks the field as fixed after creation.
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field must be non-empty at creation.
    pub const fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Whether an update may change the field.
    pub const fn is_updatable(&self) -> bool {
        self.updatable
    }
}
