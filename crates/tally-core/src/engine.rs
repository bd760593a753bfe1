//! Reconciliation engine - drives chunked row comparison between two tables

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result};
use crate::reconcile::{compare_chunk, ChunkTally};
use crate::report::ReconciliationReport;
use crate::schema::{resolve_columns, ComparisonColumn};
use crate::source::{ChunkIter, TableSource};

/// Options controlling how a reconciliation is executed.
///
/// None of these change the computed match rate, only memory use and speed.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Rows per chunk. `None` or `Some(0)` compares the whole table in one pass.
    pub chunk_size: Option<usize>,
    /// Explicit comparison columns, replacing the shared-name alignment.
    pub columns: Option<Vec<String>>,
    /// Threads comparing chunk pairs. `0` and `1` both run sequentially.
    pub workers: usize,
    /// Raised by the caller to abandon the run between chunks.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ReconcileOptions {
    pub fn whole_table() -> Self {
        Self::default()
    }

    pub fn chunked(chunk_size: usize) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn effective_chunk_size(&self) -> Option<usize> {
        self.chunk_size.filter(|&n| n > 0)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// The main reconciliation engine
pub struct ReconciliationEngine {
    options: ReconcileOptions,
}

impl ReconciliationEngine {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Compare two tables row by row and report the fraction of matching rows.
    ///
    /// Fails before reading any chunk when the tables share no columns, disagree
    /// on a column type, or have different row counts.
    pub fn reconcile(
        &self,
        left: &dyn TableSource,
        right: &dyn TableSource,
    ) -> Result<ReconciliationReport> {
        let started = Instant::now();
        let options = &self.options;

        let columns = resolve_columns(
            &left.schema(),
            &right.schema(),
            options.columns.as_deref(),
        )?;
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let left_rows = left.num_rows()?;
        let right_rows = right.num_rows()?;
        if left_rows != right_rows {
            return Err(ReconcileError::RowCountMismatch {
                left: left_rows,
                right: right_rows,
            });
        }

        let chunk_size = options.effective_chunk_size();
        info!(
            "Reconciling {} rows over {} columns (chunk size: {:?}, workers: {})",
            left_rows,
            columns.len(),
            chunk_size,
            options.workers.max(1)
        );

        let pairs = ChunkPairs {
            left: left.chunks(&names, chunk_size)?,
            right: right.chunks(&names, chunk_size)?,
            next_index: 0,
        };

        let (tally, chunks) = if options.workers > 1 {
            run_parallel(pairs, &columns, options)?
        } else {
            run_sequential(pairs, &columns, options)?
        };

        let report = ReconciliationReport::new(
            tally.matched as u64,
            tally.total as u64,
            started.elapsed(),
        )
        .with_metadata("chunk_size", chunk_size)
        .with_metadata("chunks", chunks)
        .with_metadata("columns", names)
        .with_metadata("workers", options.workers.max(1));

        info!(
            "Reconciled {}/{} rows in {:?} (match rate {:.10})",
            report.matched_rows, report.rows_compared, report.elapsed, report.match_rate
        );
        Ok(report)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(ReconcileOptions::default())
    }
}

/// Compare `left` and `right` with the given options.
pub fn reconcile(
    left: &dyn TableSource,
    right: &dyn TableSource,
    options: ReconcileOptions,
) -> Result<ReconciliationReport> {
    ReconciliationEngine::new(options).reconcile(left, right)
}

/// Lock-step iterator over the two chunk streams.
struct ChunkPairs<'a> {
    left: ChunkIter<'a>,
    right: ChunkIter<'a>,
    next_index: usize,
}

impl Iterator for ChunkPairs<'_> {
    type Item = Result<(usize, RecordBatch, RecordBatch)>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_index;
        let pair = match (self.left.next(), self.right.next()) {
            (None, None) => return None,
            (Some(Err(e)), _) | (_, Some(Err(e))) => Err(e),
            (Some(Ok(l)), Some(Ok(r))) => Ok((index, l, r)),
            // One stream ran dry first: the chunk boundaries no longer line up.
            (Some(Ok(l)), None) => Err(ReconcileError::ChunkShapeMismatch {
                chunk: index,
                left_rows: l.num_rows(),
                left_columns: l.num_columns(),
                right_rows: 0,
                right_columns: 0,
            }),
            (None, Some(Ok(r))) => Err(ReconcileError::ChunkShapeMismatch {
                chunk: index,
                left_rows: 0,
                left_columns: 0,
                right_rows: r.num_rows(),
                right_columns: r.num_columns(),
            }),
        };
        self.next_index += 1;
        Some(pair)
    }
}

fn run_sequential(
    mut pairs: ChunkPairs<'_>,
    columns: &[ComparisonColumn],
    options: &ReconcileOptions,
) -> Result<(ChunkTally, usize)> {
    let mut tally = ChunkTally::default();
    let mut chunks = 0;

    loop {
        if options.is_cancelled() {
            return Err(ReconcileError::Cancelled {
                chunks_processed: chunks,
            });
        }
        let Some(pair) = pairs.next() else {
            break;
        };
        let (index, left, right) = pair?;
        tally = tally.merge(compare_chunk(index, columns, &left, &right)?);
        chunks += 1;
    }

    Ok((tally, chunks))
}

/// Reads up to `workers` chunk pairs at a time and compares them on a dedicated pool.
fn run_parallel(
    mut pairs: ChunkPairs<'_>,
    columns: &[ComparisonColumn],
    options: &ReconcileOptions,
) -> Result<(ChunkTally, usize)> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| ReconcileError::WorkerPool(e.to_string()))?;

    let mut tally = ChunkTally::default();
    let mut chunks = 0;

    loop {
        if options.is_cancelled() {
            return Err(ReconcileError::Cancelled {
                chunks_processed: chunks,
            });
        }

        let window = pairs
            .by_ref()
            .take(options.workers)
            .collect::<Result<Vec<_>>>()?;
        if window.is_empty() {
            break;
        }

        let window_tally = pool.install(|| {
            window
                .par_iter()
                .map(|(index, left, right)| compare_chunk(*index, columns, left, right))
                .try_reduce(ChunkTally::default, |a, b| Ok(a.merge(b)))
        })?;

        chunks += window.len();
        tally = tally.merge(window_tally);
        debug!("Window of {} chunks done ({} total)", window.len(), chunks);
    }

    Ok((tally, chunks))
}
