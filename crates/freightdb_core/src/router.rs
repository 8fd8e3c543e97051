//! Positional invocation surface.
//!
//! Ledger transports call named functions with a list of text arguments.
//! The [`Router`] maps those calls onto repository operations, binding
//! positional arguments to schema fields in schema order.

use crate::error::{CoreError, CoreResult};
use crate::record::FieldMap;
use crate::repository::RecordRepository;
use crate::schema::RecordSchema;
use bytes::Bytes;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A repository operation reachable through the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create the index if absent. No arguments.
    Init,
    /// Create a record. Identifier followed by field values.
    Create,
    /// Update a record. Identifier followed by field values.
    Update,
    /// Delete a record. Identifier only.
    Delete,
    /// Read a record payload. Identifier only.
    Read,
    /// Listing of every record. No arguments.
    ListAll,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 6] = [
        Operation::Init,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
        Operation::Read,
        Operation::ListAll,
    ];

    /// Resolves a function name, including the legacy aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "init" => Some(Operation::Init),
            "create" | "init_load" => Some(Operation::Create),
            "update" | "write" => Some(Operation::Update),
            "delete" => Some(Operation::Delete),
            "read" => Some(Operation::Read),
            "list_all" | "read_all" | "show_all" => Some(Operation::ListAll),
            _ => None,
        }
    }

    /// Canonical function name.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Read => "read",
            Operation::ListAll => "list_all",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| CoreError::invalid_argument(format!("unknown function {s:?}")))
    }
}

/// Dispatches named, positional invocations to a repository.
///
/// ```rust
/// use freightdb_core::{builtin, RecordRepository, Router};
///
/// let router = Router::new(RecordRepository::open_in_memory(builtin::contract()).unwrap());
/// router.invoke("init", &[] as &[&str]).unwrap();
/// router.invoke("create", &["C-1", "ACME", "Memphis"]).unwrap();
///
/// let payload = router.invoke("read", &["C-1"]).unwrap();
/// assert!(payload.is_some());
/// ```
pub struct Router {
    repository: RecordRepository,
}

impl Router {
    /// Creates a router over `repository`.
    pub fn new(repository: RecordRepository) -> Self {
        Self { repository }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &RecordRepository {
        &self.repository
    }

    /// Invokes `function` with positional `args`.
    ///
    /// Returns the payload for `read` and `list_all` and `None` for the
    /// mutating operations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an unknown function or a
    /// wrong number of arguments, and otherwise whatever the repository
    /// operation returns.
    pub fn invoke<S: AsRef<str>>(&self, function: &str, args: &[S]) -> CoreResult<Option<Bytes>> {
        let operation: Operation = function.parse()?;
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let schema = self.repository.schema();
        debug!(schema = schema.name(), %operation, args = args.len(), "invoke");

        match operation {
            Operation::Init => {
                expect_arity(operation, &args, 0)?;
                self.repository.initialize()?;
                Ok(None)
            }
            Operation::Create => {
                let (id, fields) = create_args(schema, &args)?;
                self.repository.create(&id, &fields)?;
                Ok(None)
            }
            Operation::Update => {
                let (id, patch) = update_args(schema, &args)?;
                self.repository.update(&id, &patch)?;
                Ok(None)
            }
            Operation::Delete => {
                expect_arity(operation, &args, 1)?;
                self.repository.delete(args[0])?;
                Ok(None)
            }
            Operation::Read => {
                expect_arity(operation, &args, 1)?;
                Ok(Some(self.repository.read(args[0])?))
            }
            Operation::ListAll => {
                expect_arity(operation, &args, 0)?;
                Ok(Some(self.repository.list_all()?))
            }
        }
    }
}

fn expect_arity(operation: Operation, args: &[&str], expected: usize) -> CoreResult<()> {
    if args.len() != expected {
        return Err(CoreError::invalid_argument(format!(
            "{operation} takes {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Binds positional create arguments: the identifier, then field values in
/// schema order. Everything up to the last mandatory field is required;
/// trailing fields may be left off and default to empty.
pub fn create_args(schema: &RecordSchema, args: &[&str]) -> CoreResult<(String, FieldMap)> {
    let min = schema.required_positions();
    let max = schema.fields().len() + 1;
    if args.len() < min || args.len() > max {
        return Err(CoreError::invalid_argument(format!(
            "create {} takes {min} to {max} arguments, got {}",
            schema.name(),
            args.len()
        )));
    }
    let fields = schema
        .fields()
        .iter()
        .zip(&args[1..])
        .map(|(field, value)| (field.name().to_string(), (*value).to_string()))
        .collect();
    Ok((args[0].to_string(), fields))
}

/// Binds positional update arguments: the identifier, then values for a
/// prefix of the schema fields. Values at locked positions are ignored.
pub fn update_args(schema: &RecordSchema, args: &[&str]) -> CoreResult<(String, FieldMap)> {
    let max = schema.fields().len() + 1;
    if args.len() < 2 || args.len() > max {
        return Err(CoreError::invalid_argument(format!(
            "update {} takes 2 to {max} arguments, got {}",
            schema.name(),
            args.len()
        )));
    }
    let patch = schema
        .fields()
        .iter()
        .zip(&args[1..])
        .filter(|(field, _)| field.is_updatable())
        .map(|(field, value)| (field.name().to_string(), (*value).to_string()))
        .collect();
    Ok((args[0].to_string(), patch))
}
