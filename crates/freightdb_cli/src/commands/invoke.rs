//! Invoke command implementation.

use super::records::render;
use super::OutputFormat;
use freightdb_core::{decode_listing, Operation, Record, RecordRepository, Router};

/// Runs the invoke command.
pub fn run(
    repo: RecordRepository,
    function: &str,
    args: &[String],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let operation: Operation = function.parse()?;
    let router = Router::new(repo);
    let payload = router.invoke(function, args)?;
    let schema = router.repository().schema();

    match (operation, payload) {
        (Operation::Read, Some(bytes)) => {
            let record = Record::decode(schema, &bytes)?;
            print!("{}", render(schema, &[record], format, false)?);
        }
        (Operation::ListAll, Some(bytes)) => {
            let records = decode_listing(schema, &bytes)?;
            print!("{}", render(schema, &records, format, true)?);
        }
        _ => println!("{operation}: ok"),
    }
    Ok(())
}
