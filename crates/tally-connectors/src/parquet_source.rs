//! Parquet table source
//!
//! Reads only the requested root columns and lets the Arrow reader cut the
//! file into batches of exactly the chunk size, across row group boundaries.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tally_core::{ChunkIter, ReconcileError, Result, TableSource};
use tracing::{debug, info};

use crate::error::ConnectorError;

/// A Parquet file on the local filesystem.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
    schema: SchemaRef,
    num_rows: usize,
}

impl ParquetSource {
    /// Open the file and read its footer. No column data is read.
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, ConnectorError> {
        let path = path.as_ref().to_path_buf();
        let builder = reader_builder(&path)?;
        let schema = builder.schema().clone();
        let num_rows = builder.metadata().file_metadata().num_rows().max(0) as usize;

        info!(
            "Opened Parquet source {} ({} rows, {} columns, {} row groups)",
            path.display(),
            num_rows,
            schema.fields().len(),
            builder.metadata().num_row_groups()
        );
        Ok(Self {
            path,
            schema,
            num_rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn reader_builder(
    path: &Path,
) -> std::result::Result<ParquetRecordBatchReaderBuilder<File>, ConnectorError> {
    let file = File::open(path)
        .map_err(|e| ConnectorError::OpenFailed(format!("{}: {}", path.display(), e)))?;
    ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| ConnectorError::OpenFailed(format!("{}: {}", path.display(), e)))
}

impl TableSource for ParquetSource {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn num_rows(&self) -> Result<usize> {
        Ok(self.num_rows)
    }

    fn chunks(&self, columns: &[String], chunk_size: Option<usize>) -> Result<ChunkIter<'_>> {
        let indices = columns
            .iter()
            .map(|name| {
                self.schema
                    .index_of(name)
                    .map_err(|_| ReconcileError::ColumnNotFound {
                        column: name.clone(),
                        side: "source",
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let builder = reader_builder(&self.path)?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        let batch_size = chunk_size.filter(|&n| n > 0).unwrap_or(self.num_rows).max(1);
        let reader = builder
            .with_projection(mask)
            .with_batch_size(batch_size)
            .build()
            .map_err(ConnectorError::from)?;

        debug!(
            "Streaming {} columns from {} in batches of {}",
            columns.len(),
            self.path.display(),
            batch_size
        );
        Ok(Box::new(reader.map(|batch| {
            batch.map_err(|e| ReconcileError::from(ConnectorError::from(e)))
        })))
    }
}
