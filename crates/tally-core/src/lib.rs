//! Tally Core - row-level reconciliation engine
//!
//! This crate compares two Arrow tables row by row and reports the fraction of
//! rows whose shared columns are all equal, treating null and NaN as ordinary
//! comparable values. Tables are consumed in aligned chunks so memory stays
//! bounded regardless of table size.

pub mod engine;
pub mod equality;
pub mod error;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod source;

pub use engine::{reconcile, ReconcileOptions, ReconciliationEngine};
pub use error::{ReconcileError, Result};
pub use report::ReconciliationReport;
pub use schema::{align, resolve_columns, ComparisonColumn};
pub use source::{ChunkIter, MemoryTable, TableSource};

// Re-export for downstream consumers
pub use arrow;
pub use arrow::record_batch::RecordBatch;
