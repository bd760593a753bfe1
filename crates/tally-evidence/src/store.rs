//! Result store implementation

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::schema::ResultEntry;

/// Stored entries keyed by strategy name.
pub type ResultMap = BTreeMap<String, ResultEntry>;

/// JSON file holding the latest [`ResultEntry`] per strategy
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    /// Create a store backed by `path`. Nothing is touched until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable store is moved aside: `<stem>.corrupt.json`.
    pub fn corrupt_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results".to_string());
        self.path.with_file_name(format!("{}.corrupt.json", stem))
    }

    /// Load every entry. A missing or empty file is an empty store; a corrupt
    /// one is moved to [`corrupt_path`](Self::corrupt_path) and treated as empty.
    pub fn get_all(&self) -> Result<ResultMap> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ResultMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path));
            }
        };
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(ResultMap::new());
        }

        match serde_json::from_slice(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                let backup = self.corrupt_path();
                warn!(
                    "Result store {:?} is unreadable ({}), moving it to {:?}",
                    self.path, e, backup
                );
                if let Err(e) = fs::rename(&self.path, &backup) {
                    warn!("Failed to move corrupt store to {:?}: {}", backup, e);
                }
                Ok(ResultMap::new())
            }
        }
    }

    pub fn get(&self, strategy: &str) -> Result<Option<ResultEntry>> {
        Ok(self.get_all()?.remove(strategy))
    }

    /// Insert or replace the entry for `entry.strategy`.
    pub fn put(&self, entry: ResultEntry) -> Result<()> {
        let mut map = self.get_all()?;
        let strategy = entry.strategy.clone();
        map.insert(strategy.clone(), entry);
        self.save(&map)?;
        info!("Stored result '{}' in {:?}", strategy, self.path);
        Ok(())
    }

    /// Delete the store file. Returns whether there was one.
    pub fn wipe(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Wiped result store {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {:?}", self.path)),
        }
    }

    /// Write to a temp file beside the store, then rename it over the store.
    fn save(&self, map: &ResultMap) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        serde_json::to_writer_pretty(&mut tmp, map)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}
