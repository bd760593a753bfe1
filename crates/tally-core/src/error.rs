//! Typed errors for the reconciliation engine.

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that abort a reconciliation call. None of them leave a partial report behind.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("no overlapping columns between the two tables")]
    NoOverlappingColumns,

    #[error("column '{column}' is {left} on the left but {right} on the right")]
    ColumnTypeMismatch {
        column: String,
        left: DataType,
        right: DataType,
    },

    #[error("total row count mismatch: {left} vs {right}")]
    RowCountMismatch { left: usize, right: usize },

    #[error(
        "chunk {chunk} shape mismatch: {left_rows} rows x {left_columns} columns vs \
         {right_rows} rows x {right_columns} columns"
    )]
    ChunkShapeMismatch {
        chunk: usize,
        left_rows: usize,
        left_columns: usize,
        right_rows: usize,
        right_columns: usize,
    },

    #[error("no column equality results to reconcile")]
    NoColumnsToCompare,

    #[error("column '{column}' not found in {side} table")]
    ColumnNotFound { column: String, side: &'static str },

    #[error("column '{column}' has {left} values on the left but {right} on the right")]
    ColumnLengthMismatch {
        column: String,
        left: usize,
        right: usize,
    },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error("reconciliation cancelled after {chunks_processed} chunks")]
    Cancelled { chunks_processed: usize },

    #[error("worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("source read failed: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl ReconcileError {
    /// Wrap an error raised by a table source without altering it.
    pub fn from_source<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ReconcileError::Source(err.into())
    }
}
