//! Source factory - pluggable table sources selected by URI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tally_core::TableSource;
use tracing::info;
use url::Url;

use crate::csv_source::{CsvOptions, CsvSource};
use crate::error::ConnectorError;
use crate::parquet_source::ParquetSource;

/// A factory that opens a [`TableSource`] for the files it recognizes.
pub trait SourceFactory: Send + Sync {
    /// Returns `true` if this factory can read the file at `path`.
    fn can_handle(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn TableSource>, ConnectorError>;
}

/// Registry of source factories. Iterates factories in order and delegates
/// to the first one that can handle a URI.
pub struct SourceRegistry {
    factories: Vec<Arc<dyn SourceFactory>>,
}

impl SourceRegistry {
    pub fn new(factories: Vec<Arc<dyn SourceFactory>>) -> Self {
        Self { factories }
    }

    /// Open a bare path or a `file://` URI.
    pub fn open(&self, uri: &str) -> Result<Box<dyn TableSource>, ConnectorError> {
        let path = resolve_path(uri)?;
        for factory in &self.factories {
            if factory.can_handle(&path) {
                let source = factory.open(&path)?;
                info!("Opened source '{}'", uri);
                return Ok(source);
            }
        }
        Err(ConnectorError::UnsupportedUri(uri.to_string()))
    }
}

fn resolve_path(uri: &str) -> Result<PathBuf, ConnectorError> {
    if !uri.contains("://") {
        return Ok(PathBuf::from(uri));
    }
    let url = Url::parse(uri)
        .map_err(|e| ConnectorError::UnsupportedUri(format!("{}: {}", uri, e)))?;
    if url.scheme() != "file" {
        return Err(ConnectorError::UnsupportedUri(uri.to_string()));
    }
    url.to_file_path()
        .map_err(|_| ConnectorError::UnsupportedUri(uri.to_string()))
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

// ---------------------------------------------------------------------------
// Built-in factory implementations
// ---------------------------------------------------------------------------

/// Factory for local Parquet files.
pub struct ParquetFactory;

impl SourceFactory for ParquetFactory {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["parquet", "pq"])
    }

    fn open(&self, path: &Path) -> Result<Box<dyn TableSource>, ConnectorError> {
        Ok(Box::new(ParquetSource::open(path)?))
    }
}

/// Factory for local CSV files.
#[derive(Default)]
pub struct CsvFactory {
    pub options: CsvOptions,
}

impl SourceFactory for CsvFactory {
    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["csv"])
    }

    fn open(&self, path: &Path) -> Result<Box<dyn TableSource>, ConnectorError> {
        Ok(Box::new(CsvSource::open(path, self.options.clone())?))
    }
}

/// Build the default registry with all built-in factories.
pub fn default_registry() -> SourceRegistry {
    SourceRegistry::new(vec![
        Arc::new(ParquetFactory),
        Arc::new(CsvFactory::default()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bare_path() {
        assert_eq!(
            resolve_path("data/left.parquet").unwrap(),
            PathBuf::from("data/left.parquet")
        );
    }

    #[test]
    fn test_resolve_file_uri() {
        assert_eq!(
            resolve_path("file:///tmp/left.csv").unwrap(),
            PathBuf::from("/tmp/left.csv")
        );
    }

    #[test]
    fn test_remote_scheme_rejected() {
        assert!(matches!(
            resolve_path("s3://bucket/left.parquet"),
            Err(ConnectorError::UnsupportedUri(_))
        ));
    }

    #[test]
    fn test_factory_matching() {
        assert!(ParquetFactory.can_handle(Path::new("a.parquet")));
        assert!(ParquetFactory.can_handle(Path::new("a.PQ")));
        assert!(!ParquetFactory.can_handle(Path::new("a.csv")));
        assert!(CsvFactory::default().can_handle(Path::new("dir/a.csv")));
        assert!(!CsvFactory::default().can_handle(Path::new("a")));
    }

    #[test]
    fn test_unknown_extension() {
        let err = default_registry().open("data.xlsx").err().unwrap();
        assert!(matches!(err, ConnectorError::UnsupportedUri(_)));
    }
}
