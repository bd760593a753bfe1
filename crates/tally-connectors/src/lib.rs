//! Tally Connectors - file-backed table sources
//!
//! This crate provides [`TableSource`](tally_core::TableSource) readers for:
//! - Parquet files
//! - CSV files with an inferred schema

pub mod csv_source;
pub mod error;
pub mod factory;
pub mod parquet_source;

pub use csv_source::{CsvOptions, CsvSource};
pub use error::ConnectorError;
pub use factory::{default_registry, SourceFactory, SourceRegistry};
pub use parquet_source::ParquetSource;
