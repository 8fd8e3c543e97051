//! FreightDB CLI
//!
//! Command-line access to a FreightDB state file.
//!
//! # Commands
//!
//! - `init` - Create the record index if absent
//! - `create` / `update` / `read` / `delete` - Single-record operations
//! - `list` - Every record in index order
//! - `verify` - Reconcile the index with the stored records
//! - `invoke` - Positional invocation by function name
//! - `schema` - Describe the selected schema

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// FreightDB command-line record tools.
#[derive(Parser)]
#[command(name = "freightdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(global = true, short, long)]
    state: Option<PathBuf>,

    /// Record schema (contract, load)
    #[arg(global = true, long, default_value = "load")]
    schema: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record index if it does not exist
    Init,

    /// Create a record
    Create {
        /// Record identifier
        id: String,

        /// Field value as name=value (repeatable)
        #[arg(short, long = "field", value_parser = commands::parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Update fields of an existing record
    Update {
        /// Record identifier
        id: String,

        /// Field value as name=value (repeatable)
        #[arg(short, long = "field", value_parser = commands::parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Show one record
    Read {
        /// Record identifier
        id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete a record
    Delete {
        /// Record identifier
        id: String,
    },

    /// List every record in index order
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check that the index matches the stored records
    Verify {
        /// Rewrite the index to match the stored records
        #[arg(short, long)]
        repair: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Invoke a function with positional arguments
    Invoke {
        /// Function name (init, create, update, delete, read, list_all, ...)
        function: String,

        /// Positional arguments
        args: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Describe the selected schema
    Schema {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        state,
        schema,
        command,
        ..
    } = cli;
    let schema = commands::schema_by_name(&schema)?;

    match command {
        Commands::Init => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::init(&repo)?;
        }
        Commands::Create { id, fields } => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::create(&repo, &id, fields)?;
        }
        Commands::Update { id, fields } => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::update(&repo, &id, fields)?;
        }
        Commands::Read { id, format } => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::read(&repo, &id, format)?;
        }
        Commands::Delete { id } => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::delete(&repo, &id)?;
        }
        Commands::List { format } => {
            let repo = commands::open_repository(state, schema)?;
            commands::records::list(&repo, format)?;
        }
        Commands::Verify { repair, format } => {
            let repo = commands::open_repository(state, schema)?;
            commands::verify::run(&repo, repair, format)?;
        }
        Commands::Invoke {
            function,
            args,
            format,
        } => {
            let repo = commands::open_repository(state, schema)?;
            commands::invoke::run(repo, &function, &args, format)?;
        }
        Commands::Schema { format } => {
            commands::schema::run(&schema, format)?;
        }
        Commands::Version => {
            println!("FreightDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("FreightDB Core v{}", freightdb_core::VERSION);
        }
    }

    Ok(())
}
