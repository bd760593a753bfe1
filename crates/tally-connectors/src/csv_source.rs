//! CSV table source with an inferred schema

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::SchemaRef;
use tally_core::{ChunkIter, ReconcileError, Result, TableSource};
use tracing::{debug, info};

use crate::error::ConnectorError;

/// Parsing options for [`CsvSource`].
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub has_header: bool,
    pub delimiter: u8,
    /// Records sampled for type inference. `None` scans the whole file.
    pub infer_records: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            infer_records: Some(10_000),
        }
    }
}

/// A CSV file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    options: CsvOptions,
    schema: SchemaRef,
    num_rows: usize,
}

impl CsvSource {
    /// Infer the schema and count records. Both need a pass over the file.
    pub fn open(
        path: impl AsRef<Path>,
        options: CsvOptions,
    ) -> std::result::Result<Self, ConnectorError> {
        let path = path.as_ref().to_path_buf();

        let format = Format::default()
            .with_header(options.has_header)
            .with_delimiter(options.delimiter);
        let (schema, sampled) = format
            .infer_schema(open_file(&path)?, options.infer_records)
            .map_err(|e| ConnectorError::SchemaInference(format!("{}: {}", path.display(), e)))?;

        let num_rows = count_records(&path, &options)?;

        info!(
            "Opened CSV source {} ({} rows, {} columns, {} sampled for types)",
            path.display(),
            num_rows,
            schema.fields().len(),
            sampled
        );
        Ok(Self {
            path,
            options,
            schema: Arc::new(schema),
            num_rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_file(path: &Path) -> std::result::Result<File, ConnectorError> {
    File::open(path).map_err(|e| ConnectorError::OpenFailed(format!("{}: {}", path.display(), e)))
}

fn count_records(path: &Path, options: &CsvOptions) -> std::result::Result<usize, ConnectorError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .from_reader(open_file(path)?);

    let mut record = csv::ByteRecord::new();
    let mut count = 0;
    while reader.read_byte_record(&mut record)? {
        count += 1;
    }
    Ok(count)
}

impl TableSource for CsvSource {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn num_rows(&self) -> Result<usize> {
        Ok(self.num_rows)
    }

    fn chunks(&self, columns: &[String], chunk_size: Option<usize>) -> Result<ChunkIter<'_>> {
        let projection = columns
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

        let batch_size = chunk_size.filter(|&n| n > 0).unwrap_or(self.num_rows).max(1);
        let reader = ReaderBuilder::new(self.schema.clone())
            .with_header(self.options.has_header)
            .with_delimiter(self.options.delimiter)
            .with_batch_size(batch_size)
            .with_projection(projection)
            .build(open_file(&self.path)?)
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
