//! Reference model of repository semantics.
//!
//! The model keeps records and the index in plain collections and applies
//! operations with the documented outcomes. Property tests drive a real
//! repository and the model with the same operations and compare them.

use crate::generators::Op;
use freightdb_core::{builtin, decode_listing, ErrorKind, FieldMap, RecordRepository};
use std::collections::BTreeMap;

/// Outcome class of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded.
    Ok,
    /// Create on a live identifier.
    AlreadyExists,
    /// Update of a missing identifier.
    NotFound,
    /// Rejected arguments.
    InvalidArgument,
    /// Backend-class failure.
    Backend,
}

impl From<ErrorKind> for Outcome {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidArgument => Outcome::InvalidArgument,
            ErrorKind::AlreadyExists => Outcome::AlreadyExists,
            ErrorKind::NotFound => Outcome::NotFound,
            ErrorKind::Backend => Outcome::Backend,
        }
    }
}

/// In-memory model of a load repository.
#[derive(Debug, Clone, Default)]
pub struct ReferenceModel {
    records: BTreeMap<String, FieldMap>,
    index: Vec<String>,
}

impl ReferenceModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `op` and returns its expected outcome.
    pub fn apply(&mut self, op: &Op) -> Outcome {
        match op {
            Op::Create {
                id,
                carrier,
                ship_date,
            } => {
                if self.records.contains_key(id) {
                    return Outcome::AlreadyExists;
                }
                let mut fields = builtin::load().blank_fields();
                fields.insert("carrier".into(), carrier.clone());
                fields.insert("shipDate".into(), ship_date.clone());
                self.records.insert(id.clone(), fields);
                self.index.push(id.clone());
                Outcome::Ok
            }
            Op::Update { id, status } => match self.records.get_mut(id) {
                Some(fields) => {
                    fields.insert("status".into(), status.clone());
                    Outcome::Ok
                }
                None => Outcome::NotFound,
            },
            Op::Delete { id } => {
                self.records.remove(id);
                self.index.retain(|entry| entry != id);
                Outcome::Ok
            }
        }
    }

    /// Expected index contents.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Expected fields of `id`.
    pub fn record(&self, id: &str) -> Option<&FieldMap> {
        self.records.get(id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the model holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Applies `op` to a load repository and classifies the result.
pub fn apply_to_repository(repo: &RecordRepository, op: &Op) -> Outcome {
    let result = match op {
        Op::Create {
            id,
            carrier,
            ship_date,
        } => repo
            .create(id, &crate::fixtures::load_fields(carrier, ship_date))
            .map(|_| ()),
        Op::Update { id, status } => repo
            .update(id, &crate::fixtures::fields(&[("status", status.as_str())]))
            .map(|_| ()),
        Op::Delete { id } => repo.delete(id).map(|_| ()),
    };
    match result {
        Ok(()) => Outcome::Ok,
        Err(err) => err.kind().into(),
    }
}

/// Compares a repository's index, records and listing against the model.
///
/// Returns a description of the first difference.
pub fn compare_with_model(repo: &RecordRepository, model: &ReferenceModel) -> Result<(), String> {
    let ids = repo.ids().map_err(|e| e.to_string())?;
    if ids != model.index() {
        return Err(format!("index {ids:?} != model {:?}", model.index()));
    }

    for id in model.index() {
        let record = repo.get(id).map_err(|e| format!("get {id}: {e}"))?;
        if Some(record.fields()) != model.record(id) {
            return Err(format!("record {id} differs from model"));
        }
    }

    let listing = repo.list_all().map_err(|e| e.to_string())?;
    let listed: Vec<String> = decode_listing(repo.schema(), &listing)
        .map_err(|e| e.to_string())?
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    if listed != model.index() {
        return Err(format!("listing order {listed:?} != model {:?}", model.index()));
    }
    Ok(())
}
