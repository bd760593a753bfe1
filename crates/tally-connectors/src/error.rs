//! Typed errors for the connectors crate.

use std::fmt;

use tally_core::ReconcileError;

/// Errors that can occur while opening or reading a table source.
#[derive(Debug)]
pub enum ConnectorError {
    /// No registered factory accepts the URI.
    UnsupportedUri(String),
    /// The file could not be opened or its metadata is unreadable.
    OpenFailed(String),
    /// Reading data from an opened source failed.
    ReadFailed(String),
    /// A CSV schema could not be inferred.
    SchemaInference(String),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::UnsupportedUri(msg) => write!(f, "unsupported URI: {}", msg),
            ConnectorError::OpenFailed(msg) => write!(f, "open failed: {}", msg),
            ConnectorError::ReadFailed(msg) => write!(f, "read failed: {}", msg),
            ConnectorError::SchemaInference(msg) => write!(f, "schema inference failed: {}", msg),
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<parquet::errors::ParquetError> for ConnectorError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        ConnectorError::ReadFailed(e.to_string())
    }
}

impl From<arrow::error::ArrowError> for ConnectorError {
    fn from(e: arrow::error::ArrowError) -> Self {
        ConnectorError::ReadFailed(e.to_string())
    }
}

impl From<csv::Error> for ConnectorError {
    fn from(e: csv::Error) -> Self {
        ConnectorError::ReadFailed(e.to_string())
    }
}

impl From<ConnectorError> for ReconcileError {
    fn from(e: ConnectorError) -> Self {
        ReconcileError::from_source(e)
    }
}
