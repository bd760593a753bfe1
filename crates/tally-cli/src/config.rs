//! CLI configuration from environment variables.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 131_072;

/// Keys accepted in an object-shaped tuning file, in lookup order.
pub const TUNING_KEYS: [&str; 4] = [
    "optimal_batch_size",
    "batch_size",
    "best_batch",
    "tuned_batch_size",
];

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub results_path: PathBuf,
    /// Repetitions per `run`; elapsed time is averaged over them.
    pub runs: usize,
    pub workers: usize,
    /// Output of an offline chunk-size sweep.
    pub tuning_path: PathBuf,
    /// Used when the tuning file is absent or unusable.
    pub default_chunk_size: usize,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            results_path: std::env::var("TALLY_RESULTS_PATH")
                .unwrap_or_else(|_| "results.json".to_string())
                .into(),
            runs: std::env::var("TALLY_RUNS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid TALLY_RUNS")?,
            workers: std::env::var("TALLY_WORKERS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid TALLY_WORKERS")?,
            tuning_path: std::env::var("TALLY_TUNING_PATH")
                .unwrap_or_else(|_| "tuning.json".to_string())
                .into(),
            default_chunk_size: std::env::var("TALLY_DEFAULT_CHUNK_SIZE")
                .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE.to_string())
                .parse()
                .context("Invalid TALLY_DEFAULT_CHUNK_SIZE")?,
        };

        if config.runs == 0 {
            bail!("TALLY_RUNS must be at least 1");
        }
        if config.default_chunk_size == 0 {
            bail!("TALLY_DEFAULT_CHUNK_SIZE must be at least 1");
        }
        Ok(config)
    }
}

/// Read the tuned chunk size, falling back to `default` when the file is
/// missing, empty, unreadable or does not hold a positive integer.
pub fn load_tuned_chunk_size(path: &Path, default: usize) -> usize {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No tuning file at {:?}, using chunk size {}", path, default);
            return default;
        }
        Err(e) => {
            warn!("Cannot read tuning file {:?} ({}), using chunk size {}", path, e, default);
            return default;
        }
    };

    if contents.trim().is_empty() {
        warn!("Tuning file {:?} is empty, using chunk size {}", path, default);
        return default;
    }

    match serde_json::from_str::<Value>(&contents).ok().and_then(|v| tuned_value(&v)) {
        Some(size) => {
            info!("Using tuned chunk size {} from {:?}", size, path);
            size
        }
        None => {
            warn!(
                "Tuning file {:?} holds no positive chunk size, using {}",
                path, default
            );
            default
        }
    }
}

fn tuned_value(value: &Value) -> Option<usize> {
    let found = match value {
        Value::Number(_) => value,
        Value::Object(map) => TUNING_KEYS.iter().find_map(|key| map.get(*key))?,
        _ => return None,
    };
    found.as_u64().filter(|&n| n > 0).map(|n| n as usize)
}
