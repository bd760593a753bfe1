//! Result store schema definitions

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::ReconciliationReport;
use uuid::Uuid;

/// Decimal places kept for rates and timings.
pub const STORED_DECIMALS: i32 = 10;

/// Stored outcome of one benchmarked strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Strategy name the entry is keyed by
    pub strategy: String,

    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,

    pub match_rate: f64,

    /// Mean elapsed seconds across repetitions
    pub time_taken_sec: f64,

    pub rows_compared: u64,
    pub matched_rows: u64,

    /// Repetitions averaged into `time_taken_sec`
    pub runs: usize,

    /// Chunk size used, `None` for a whole-table pass
    pub chunk_size: Option<usize>,

    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ResultEntry {
    /// Build an entry from a report and the mean elapsed time over `runs` repetitions.
    pub fn new(
        strategy: impl Into<String>,
        report: &ReconciliationReport,
        runs: usize,
        mean_elapsed: Duration,
    ) -> Self {
        let chunk_size = report
            .metadata
            .get("chunk_size")
            .and_then(Value::as_u64)
            .map(|n| n as usize);

        Self {
            run_id: Uuid::new_v4(),
            strategy: strategy.into(),
            recorded_at: Utc::now(),
            match_rate: round_to(report.match_rate, STORED_DECIMALS),
            time_taken_sec: round_to(mean_elapsed.as_secs_f64(), STORED_DECIMALS),
            rows_compared: report.rows_compared,
            matched_rows: report.matched_rows,
            runs,
            chunk_size,
            metadata: report.metadata.clone(),
        }
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
