//! Verify command implementation.

use super::OutputFormat;
use freightdb_core::{ReconcileReport, RecordRepository};

/// Runs the verify command.
pub fn run(
    repo: &RecordRepository,
    repair: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = repo.reconcile(repair)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(repo.schema().name(), &report),
    }

    if !report.is_consistent() && !report.repaired {
        return Err("index and records disagree (run with --repair to fix)".into());
    }
    Ok(())
}

fn print_report(schema: &str, report: &ReconcileReport) {
    println!("Verifying {schema} records");
    println!();
    println!("  Index entries:     {}", report.indexed);
    println!("  Stored records:    {}", report.records);
    print_ids("Orphaned records", &report.orphans);
    print_ids("Dangling entries", &report.dangling);
    print_ids("Duplicate entries", &report.duplicates);
    print_ids("Foreign keys", &report.foreign);
    println!();

    if report.is_consistent() {
        println!("✓ Index matches stored records");
    } else if report.repaired {
        println!("✓ Index repaired");
    } else {
        println!("✗ Index and records disagree");
    }
}

fn print_ids(label: &str, ids: &[String]) {
    if ids.is_empty() {
        println!("  {:<18} 0", format!("{label}:"));
    } else {
        println!("  {:<18} {} ({})", format!("{label}:"), ids.len(), ids.join(", "));
    }
}
