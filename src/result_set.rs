//! Result set collection and name-based field lookup.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::message::BackendMessage;

/// One row of column values; `None` is SQL NULL.
pub type Row = Vec<Option<Vec<u8>>>;

/// A fully received result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Column names from the RowDescription, in wire order
    pub field_names: Vec<String>,
    /// Rows in arrival order
    pub rows: Vec<Row>,
}

/// Outcome of feeding one message to a [`ResultSetReader`].
#[derive(Debug)]
pub enum ReadProgress {
    /// The result set is still open.
    Pending,
    /// CommandComplete arrived; the result set is finished.
    Complete(ResultSet),
    /// The message does not belong to a result set and was not consumed.
    Unhandled(BackendMessage),
}

/// Accumulates the messages of one result set.
///
/// A RowDescription replaces the field list, DataRows append rows, and
/// CommandComplete ends the set. An ErrorResponse discards everything
/// received so far.
#[derive(Debug, Default)]
pub struct ResultSetReader {
    current: ResultSet,
}

impl ResultSetReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next message of the result set.
    pub fn feed(&mut self, msg: BackendMessage) -> Result<ReadProgress> {
        match msg {
            BackendMessage::RowDescription { fields } => {
                self.current.field_names = fields.into_iter().map(|f| f.name).collect();
                Ok(ReadProgress::Pending)
            }
            BackendMessage::DataRow { values } => {
                self.current.rows.push(values);
                Ok(ReadProgress::Pending)
            }
            BackendMessage::CommandComplete { tag } => {
                let result_set = std::mem::take(&mut self.current);
                tracing::debug!(
                    tag = %tag,
                    fields = result_set.field_names.len(),
                    rows = result_set.rows.len(),
                    "result set complete"
                );
                Ok(ReadProgress::Complete(result_set))
            }
            BackendMessage::ErrorResponse(fields) => {
                self.current = ResultSet::default();
                Err(Error::Server(fields))
            }
            other => Ok(ReadProgress::Unhandled(other)),
        }
    }
}

/// Name → position mapping over a result set's fields.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    positions: HashMap<String, usize>,
}

impl FieldIndex {
    /// Map the fields of `result_set`, failing if any of `required` is absent.
    ///
    /// Duplicate names resolve to the last occurrence.
    pub fn new(result_set: &ResultSet, required: &[&str]) -> Result<Self> {
        let positions: HashMap<String, usize> = result_set
            .field_names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();

        if let Some(missing) = required.iter().find(|name| !positions.contains_key(**name)) {
            return Err(Error::MissingField((*missing).to_string()));
        }

        Ok(Self { positions })
    }

    /// Position of a field, if present.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Value of the named field in `row`.
    ///
    /// Returns `Ok(None)` for NULL. A row too short for the field's position is
    /// a protocol error.
    pub fn value<'r>(&self, row: &'r Row, name: &str) -> Result<Option<&'r [u8]>> {
        let index = self
            .get(name)
            .ok_or_else(|| Error::MissingField(name.to_string()))?;
        row.get(index)
            .map(Option::as_deref)
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "row has {} columns, field \"{name}\" is at position {index}",
                    row.len()
                ))
            })
    }
}
