//! CLI command implementations.

pub mod invoke;
pub mod records;
pub mod schema;
pub mod verify;

use freightdb_core::{builtin, FieldMap, Record, RecordRepository, RecordSchema, RepositoryConfig};
use freightdb_state::FileState;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Output format for commands that print data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// The schema name is not a built-in schema.
    #[error("unknown schema {name:?}, expected one of: {}", builtin::NAMES.join(", "))]
    UnknownSchema {
        /// The rejected name.
        name: String,
    },

    /// No state file was given.
    #[error("state file path required (--state)")]
    MissingState,

    /// A field was given twice.
    #[error("field {name:?} given more than once")]
    DuplicateField {
        /// The repeated field name.
        name: String,
    },
}

/// Resolves a built-in schema.
pub fn schema_by_name(name: &str) -> Result<RecordSchema, CliError> {
    builtin::by_name(name).ok_or_else(|| CliError::UnknownSchema {
        name: name.to_string(),
    })
}

/// Opens the repository over the state file at `state`, creating parent
/// directories as needed.
pub fn open_repository(
    state: Option<PathBuf>,
    schema: RecordSchema,
) -> Result<RecordRepository, Box<dyn std::error::Error>> {
    let path = state.ok_or(CliError::MissingState)?;
    let backend = FileState::open_with_create_dirs(&path)?;
    tracing::debug!(path = %path.display(), schema = schema.name(), "opened state file");
    Ok(RecordRepository::open(
        Arc::new(backend),
        schema,
        RepositoryConfig::default(),
    )?)
}

/// Parses a `name=value` argument.
pub fn parse_field(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {arg:?}"))?;
    if name.is_empty() {
        return Err(format!("missing field name in {arg:?}"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Collects parsed fields, rejecting repeats.
pub fn field_map(pairs: Vec<(String, String)>) -> Result<FieldMap, CliError> {
    let mut fields = FieldMap::new();
    for (name, value) in pairs {
        if fields.contains_key(&name) {
            return Err(CliError::DuplicateField { name });
        }
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Renders a record as a JSON object keyed by payload field names.
pub fn record_json(schema: &RecordSchema, record: &Record) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert(
        schema.id_field().to_string(),
        serde_json::Value::String(record.id().to_string()),
    );
    for (name, value) in record.fields() {
        object.insert(name.clone(), serde_json::Value::String(value.clone()));
    }
    serde_json::Value::Object(object)
}

/// Renders a record as indented text in schema field order.
pub fn record_text(schema: &RecordSchema, record: &Record) -> String {
    let width = schema
        .fields()
        .iter()
        .map(|f| f.name().len())
        .chain(std::iter::once(schema.id_field().len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:width$}  {}\n", schema.id_field(), record.id());
    for field in schema.fields() {
        let value = record.field(field.name()).unwrap_or_default();
        out.push_str(&format!("{:width$}  {}\n", field.name(), value));
    }
    out
}
