//! Columnar table sources consumed by the engine.

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::error::{ReconcileError, Result};

/// Stream of projected chunks produced by a [`TableSource`].
pub type ChunkIter<'a> = Box<dyn Iterator<Item = Result<RecordBatch>> + 'a>;

/// A readable columnar table.
///
/// Implementations must yield chunks of exactly `chunk_size` rows except for
/// the final one, so that two sources read with the same size line up row for
/// row. A zero-row table yields no chunks.
pub trait TableSource {
    /// Full schema of the table.
    fn schema(&self) -> SchemaRef;

    /// Row count known without scanning data.
    fn num_rows(&self) -> Result<usize>;

    /// Stream the named columns in chunks. `None` reads the whole table as one chunk.
    fn chunks(&self, columns: &[String], chunk_size: Option<usize>) -> Result<ChunkIter<'_>>;
}

/// A table held in memory as record batches sharing one schema.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: SchemaRef,
    batch: RecordBatch,
}

impl MemoryTable {
    /// Build a table from batches. The batches are concatenated once up front.
    pub fn try_new(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { schema, batch })
    }

    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batch,
        }
    }
}

impl TableSource for MemoryTable {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn num_rows(&self) -> Result<usize> {
        Ok(self.batch.num_rows())
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
        let projected = self.batch.project(&indices)?;

        let total = projected.num_rows();
        let step = chunk_size.filter(|&n| n > 0).unwrap_or(total).max(1);
        let offsets = (0..total).step_by(step);

        Ok(Box::new(offsets.map(move |offset| {
            let len = step.min(total - offset);
            Ok(projected.slice(offset, len))
        })))
    }
}
