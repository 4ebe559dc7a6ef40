//! Storage backend (Arrow table + destructive-reload sinks)
//!
//! **Full-Reload Design**:
//! - Every run rebuilds the `bug` table from scratch
//! - Write pattern: build Arrow batches, then hand the whole table to a sink
//! - The sink drops whatever it held before and writes the new table
//! - NOT suitable for: incremental or per-bug updates
//!
//! ```text
//! Vec<BugRecord> ──> BugTable (RecordBatch[]) ──> TableSink::replace
//!                                                  ├── SqliteSink
//!                                                  └── ParquetSink
//! ```

mod parquet_sink;
mod sqlite_sink;

pub use parquet_sink::ParquetSink;
pub use sqlite_sink::SqliteSink;

use crate::bug::BugRecord;
use crate::{Error, Result};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Name of the table every sink (re)creates.
pub const TABLE_NAME: &str = "bug";

/// Kind of a base column, which fixes its Arrow and SQL types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 64-bit integer
    Integer,
    /// Boolean flag
    Boolean,
    /// Free text
    Text,
}

impl ColumnKind {
    const fn data_type(self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Boolean => DataType::Boolean,
            Self::Text => DataType::Utf8,
        }
    }
}

/// Fixed columns of the `bug` table, in table order.
pub const BASE_COLUMNS: [(&str, ColumnKind); 17] = [
    ("id", ColumnKind::Integer),
    ("version", ColumnKind::Text),
    ("target_milestone", ColumnKind::Text),
    ("status", ColumnKind::Text),
    ("severity", ColumnKind::Text),
    ("resolution", ColumnKind::Text),
    ("dupe_of", ColumnKind::Integer),
    ("product", ColumnKind::Text),
    ("platform", ColumnKind::Text),
    ("op_sys", ColumnKind::Text),
    ("keywords", ColumnKind::Text),
    ("is_confirmed", ColumnKind::Boolean),
    ("creator", ColumnKind::Text),
    ("creation_time", ColumnKind::Text),
    ("whiteboard", ColumnKind::Text),
    ("release_channel", ColumnKind::Text),
    ("release_cycle", ColumnKind::Integer),
];

/// Build the table schema: base columns, then one nullable text column per
/// tracking field (first occurrence wins if a name repeats).
#[must_use]
pub fn bug_table_schema(tracking_fields: &[String]) -> SchemaRef {
    let mut seen: HashSet<&str> = BASE_COLUMNS.iter().map(|(name, _)| *name).collect();

    let mut fields: Vec<Field> = BASE_COLUMNS
        .iter()
        .map(|&(name, kind)| Field::new(name, kind.data_type(), name != "id"))
        .collect();
    fields.extend(
        tracking_fields
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .map(|name| Field::new(name, DataType::Utf8, true)),
    );

    Arc::new(Schema::new(fields))
}

/// Text rendering of a JSON value for a text column.
fn text_cell(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Integer rendering of a JSON value; non-integers become NULL.
fn integer_cell(value: Option<Value>) -> Option<i64> {
    value?.as_i64()
}

fn boolean_cell(value: Option<Value>) -> Option<bool> {
    value?.as_bool()
}

/// In-memory `bug` table, held as Arrow record batches.
///
/// Append-only: batches are validated against the table schema, rows are
/// never updated in place.
#[derive(Debug)]
pub struct BugTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl BugTable {
    /// Create an empty table with base columns plus `tracking_fields`.
    #[must_use]
    pub fn new(tracking_fields: &[String]) -> Self {
        Self {
            schema: bug_table_schema(tracking_fields),
            batches: Vec::new(),
        }
    }

    /// Create a table holding `records`.
    ///
    /// # Errors
    ///
    /// Returns error if a record cannot be converted (see [`append_records`](Self::append_records)).
    pub fn from_records(tracking_fields: &[String], records: &[BugRecord]) -> Result<Self> {
        let mut table = Self::new(tracking_fields);
        table.append_records(records)?;
        Ok(table)
    }

    /// Table schema.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total rows across batches.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Convert `records` into one batch and append it.
    ///
    /// Extra fields not named by the schema are ignored; missing ones are NULL.
    ///
    /// # Errors
    ///
    /// Returns error if a bug id does not fit a signed 64-bit column.
    pub fn append_records(&mut self, records: &[BugRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let batch = self.records_to_batch(records)?;
        self.append_batch(batch)
    }

    fn records_to_batch(&self, records: &[BugRecord]) -> Result<RecordBatch> {
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.schema.fields().len());

        for field in self.schema.fields() {
            let name = field.name().as_str();
            let column: ArrayRef = match field.data_type() {
                DataType::Int64 if name == "id" => {
                    let ids = records
                        .iter()
                        .map(|bug| {
                            i64::try_from(bug.id()).map_err(|_| {
                                Error::StorageError(format!("bug id {} overflows i64", bug.id()))
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    Arc::new(Int64Array::from(ids))
                }
                DataType::Int64 => Arc::new(Int64Array::from(
                    records
                        .iter()
                        .map(|bug| integer_cell(bug.column(name)))
                        .collect::<Vec<_>>(),
                )),
                DataType::Boolean => Arc::new(BooleanArray::from(
                    records
                        .iter()
                        .map(|bug| boolean_cell(bug.column(name)))
                        .collect::<Vec<_>>(),
                )),
                _ => Arc::new(StringArray::from(
                    records
                        .iter()
                        .map(|bug| text_cell(bug.column(name)))
                        .collect::<Vec<_>>(),
                )),
            };
            columns.push(column);
        }

        Ok(RecordBatch::try_new(self.schema(), columns)?)
    }

    /// Append a batch to the table.
    ///
    /// **WARNING**: This is the ONLY supported write operation. The table is
    /// rebuilt per run, never patched row by row.
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match the table schema
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        if batch.schema() != self.schema {
            return Err(Error::StorageError(format!(
                "Schema mismatch: expected {:?}, got {:?}",
                self.schema,
                batch.schema()
            )));
        }

        self.batches.push(batch);
        Ok(())
    }
}

/// Destination that replaces its whole `bug` table with a new one.
pub trait TableSink {
    /// Drop the previous table and write `table` in its place.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns error if the destination cannot be written.
    fn replace(&mut self, table: &BugTable) -> Result<usize>;
}
