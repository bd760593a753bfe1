//! Row reconciliation - folds per-column equality into one flag per row

use arrow::array::{Array, BooleanArray};
use arrow::compute::and;
use arrow::record_batch::RecordBatch;
use tracing::debug;

use crate::equality::column_eq;
use crate::error::{ReconcileError, Result};
use crate::schema::ComparisonColumn;

/// Matched and total rows for one chunk pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkTally {
    pub matched: usize,
    pub total: usize,
}

impl ChunkTally {
    pub fn merge(self, other: ChunkTally) -> ChunkTally {
        ChunkTally {
            matched: self.matched + other.matched,
            total: self.total + other.total,
        }
    }
}

/// AND-reduce column equality results into a per-row match flag.
///
/// Every input must be `row_count` long. The reduction is order independent.
pub fn reconcile_rows(column_matches: &[BooleanArray], row_count: usize) -> Result<BooleanArray> {
    let (first, rest) = column_matches
        .split_first()
        .ok_or(ReconcileError::NoColumnsToCompare)?;

    for (i, matches) in column_matches.iter().enumerate() {
        if matches.len() != row_count {
            return Err(ReconcileError::ColumnLengthMismatch {
                column: format!("#{i}"),
                left: matches.len(),
                right: row_count,
            });
        }
    }

    rest.iter().try_fold(first.clone(), |acc, next| {
        and(&acc, next).map_err(ReconcileError::from)
    })
}

/// Number of rows flagged as matching. Null flags never count.
pub fn count_matches(row_match: &BooleanArray) -> usize {
    row_match.true_count()
}

/// Compare one aligned chunk pair over the given columns.
///
/// Both chunks must carry the same number of rows and columns, otherwise the
/// pairing is broken and the call fails with [`ReconcileError::ChunkShapeMismatch`].
pub fn compare_chunk(
    chunk: usize,
    columns: &[ComparisonColumn],
    left: &RecordBatch,
    right: &RecordBatch,
) -> Result<ChunkTally> {
    if left.num_rows() != right.num_rows() || left.num_columns() != right.num_columns() {
        return Err(ReconcileError::ChunkShapeMismatch {
            chunk,
            left_rows: left.num_rows(),
            left_columns: left.num_columns(),
            right_rows: right.num_rows(),
            right_columns: right.num_columns(),
        });
    }

    let column_matches = columns
        .iter()
        .map(|column| {
            let l = chunk_column(left, &column.name, "left")?;
            let r = chunk_column(right, &column.name, "right")?;
            column_eq(&column.name, l.as_ref(), r.as_ref())
        })
        .collect::<Result<Vec<_>>>()?;

    let row_match = reconcile_rows(&column_matches, left.num_rows())?;
    let tally = ChunkTally {
        matched: count_matches(&row_match),
        total: left.num_rows(),
    };

    debug!(
        "Chunk {}: {}/{} rows matched",
        chunk, tally.matched, tally.total
    );
    Ok(tally)
}

fn chunk_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    side: &'static str,
) -> Result<&'a arrow::array::ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ReconcileError::ColumnNotFound {
            column: name.to_string(),
            side,
        })
}
