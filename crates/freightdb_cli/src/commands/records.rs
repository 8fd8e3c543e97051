//! Single-record and listing commands.

use super::{field_map, record_json, record_text, OutputFormat};
use freightdb_core::{Record, RecordRepository, RecordSchema};
use tracing::info;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Runs the init command.
pub fn init(repo: &RecordRepository) -> CommandResult {
    if repo.initialize()? {
        info!(index = repo.schema().index_key(), "created empty index");
    } else {
        info!(index = repo.schema().index_key(), "index already present");
    }
    Ok(())
}

/// Runs the create command.
pub fn create(repo: &RecordRepository, id: &str, fields: Vec<(String, String)>) -> CommandResult {
    let record = repo.create(id, &field_map(fields)?)?;
    info!(id = record.id(), schema = repo.schema().name(), "created");
    Ok(())
}

/// Runs the update command.
pub fn update(repo: &RecordRepository, id: &str, fields: Vec<(String, String)>) -> CommandResult {
    let record = repo.update(id, &field_map(fields)?)?;
    info!(id = record.id(), schema = repo.schema().name(), "updated");
    Ok(())
}

/// Runs the read command.
pub fn read(repo: &RecordRepository, id: &str, format: OutputFormat) -> CommandResult {
    let record = repo.get(id)?;
    print!("{}", render(repo.schema(), std::slice::from_ref(&record), format, false)?);
    Ok(())
}

/// Runs the delete command.
pub fn delete(repo: &RecordRepository, id: &str) -> CommandResult {
    if repo.delete(id)? {
        info!(%id, "deleted");
    } else {
        info!(%id, "no index entry; record key cleared");
    }
    Ok(())
}

/// Runs the list command.
pub fn list(repo: &RecordRepository, format: OutputFormat) -> CommandResult {
    let records = repo.records()?;
    print!("{}", render(repo.schema(), &records, format, true)?);
    Ok(())
}

/// Renders records. Listings wrap JSON output under the listing field.
pub fn render(
    schema: &RecordSchema,
    records: &[Record],
    format: OutputFormat,
    listing: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => {
            let items: Vec<_> = records.iter().map(|r| record_json(schema, r)).collect();
            let value = if listing {
                let mut map = serde_json::Map::new();
                map.insert(schema.listing_field().to_string(), items.into());
                serde_json::Value::Object(map)
            } else {
                items.into_iter().next().unwrap_or(serde_json::Value::Null)
            };
            Ok(serde_json::to_string_pretty(&value)? + "\n")
        }
        OutputFormat::Text => {
            if listing && records.is_empty() {
                return Ok(format!("No {} records.\n", schema.name()));
            }
            Ok(records
                .iter()
                .map(|r| record_text(schema, r))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
