//! SQLite sink: drop, recreate and fill the `bug` table in one transaction.

use super::{BugTable, TableSink, TABLE_NAME};
use crate::{Error, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::info;

/// Relational sink backed by a SQLite database.
///
/// A failed load rolls back and leaves the previous table in place.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Open a private in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Underlying connection, for querying the loaded table.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Int64 => Ok("INTEGER"),
        DataType::Boolean => Ok("BOOLEAN"),
        DataType::Utf8 => Ok("TEXT"),
        other => Err(Error::StorageError(format!(
            "no SQL column type for {other:?}"
        ))),
    }
}

fn create_table_sql(table: &BugTable) -> Result<String> {
    let columns = table
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let mut column = format!(
                "{} {}",
                quote_ident(field.name()),
                sql_type(field.data_type())?
            );
            if field.name() == "id" {
                column.push_str(" PRIMARY KEY");
            }
            Ok(column)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_ident(TABLE_NAME),
        columns.join(", ")
    ))
}

fn insert_sql(table: &BugTable) -> String {
    let schema = table.schema();
    let names: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| quote_ident(field.name()))
        .collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(TABLE_NAME),
        names.join(", "),
        placeholders.join(", ")
    )
}

fn cell(batch: &RecordBatch, column: usize, row: usize) -> SqlValue {
    let array = batch.column(column);
    if array.is_null(row) {
        return SqlValue::Null;
    }
    match array.data_type() {
        DataType::Int64 => SqlValue::Integer(array.as_primitive::<Int64Type>().value(row)),
        DataType::Boolean => SqlValue::Integer(i64::from(array.as_boolean().value(row))),
        _ => SqlValue::Text(array.as_string::<i32>().value(row).to_string()),
    }
}

impl TableSink for SqliteSink {
    fn replace(&mut self, table: &BugTable) -> Result<usize> {
        let create = create_table_sql(table)?;
        let insert = insert_sql(table);

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(TABLE_NAME)), [])?;
        tx.execute(&create, [])?;

        let mut rows = 0;
        {
            let mut stmt = tx.prepare(&insert)?;
            for batch in table.batches() {
                for row in 0..batch.num_rows() {
                    let values = (0..batch.num_columns()).map(|column| cell(batch, column, row));
                    stmt.execute(params_from_iter(values))?;
                    rows += 1;
                }
            }
        }
        tx.commit()?;

        info!(rows, table = TABLE_NAME, "replaced sqlite table");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bug::BugRecord;
    use crate::train::Channel;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("bug"), "\"bug\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_create_table_sql() {
        let table = BugTable::new(&["cf_status_firefox50".to_string()]);
        let sql = create_table_sql(&table).unwrap();
        assert!(sql.starts_with("CREATE TABLE \"bug\" (\"id\" INTEGER PRIMARY KEY, "));
        assert!(sql.contains("\"is_confirmed\" BOOLEAN"));
        assert!(sql.ends_with("\"cf_status_firefox50\" TEXT)"));
    }

    #[test]
    fn test_replace_drops_previous_rows() {
        let mut sink = SqliteSink::open_in_memory().unwrap();

        let mut old = BugRecord::new(1, "2016-06-06", "trunk");
        old.set_release(49, Channel::Nightly);
        let first = BugTable::from_records(&[], &[old]).unwrap();
        assert_eq!(sink.replace(&first).unwrap(), 1);

        let mut new = BugRecord::new(2, "2016-08-03", "48 branch");
        new.set_release(48, Channel::Release);
        let second = BugTable::from_records(&[], &[new]).unwrap();
        assert_eq!(sink.replace(&second).unwrap(), 1);

        let ids: Vec<i64> = sink
            .connection()
            .prepare("SELECT id FROM bug")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![2]);
    }
}
