//! Parquet sink: rewrite one Parquet file per run.

use super::{BugTable, TableSink};
use crate::Result;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columnar sink writing the whole table to a single Parquet file.
pub struct ParquetSink {
    path: PathBuf,
}

impl ParquetSink {
    /// Sink writing to `path`, truncating it on every [`replace`](TableSink::replace).
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Output file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for ParquetSink {
    fn replace(&mut self, table: &BugTable) -> Result<usize> {
        let file = File::create(&self.path)?;
        let mut writer = ArrowWriter::try_new(file, table.schema(), None)?;
        for batch in table.batches() {
            writer.write(batch)?;
        }
        writer.close()?;

        let rows = table.num_rows();
        info!(rows, path = %self.path.display(), "rewrote parquet table");
        Ok(rows)
    }
}
