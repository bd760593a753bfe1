//! Reconciliation report produced by one engine run

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one completed reconciliation. Never built for a failed or cancelled run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Fraction of rows whose compared columns are all equal, in `[0, 1]`
    pub match_rate: f64,

    /// Rows compared on each side
    pub rows_compared: u64,

    /// Rows where every compared column matched
    pub matched_rows: u64,

    /// Wall-clock time spent in the engine
    pub elapsed: Duration,

    /// Run diagnostics such as the chunk size used
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ReconciliationReport {
    pub fn new(matched_rows: u64, rows_compared: u64, elapsed: Duration) -> Self {
        Self {
            match_rate: match_rate(matched_rows, rows_compared),
            rows_compared,
            matched_rows,
            elapsed,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn mismatched_rows(&self) -> u64 {
        self.rows_compared - self.matched_rows
    }
}

/// `matched / total`, or 1.0 when there is nothing to compare.
pub fn match_rate(matched: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        matched as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_rate() {
        assert_eq!(match_rate(995, 1000), 0.995);
        assert_eq!(match_rate(0, 10), 0.0);
        assert_eq!(match_rate(10, 10), 1.0);
    }

    #[test]
    fn test_vacuous_match_rate() {
        assert_eq!(match_rate(0, 0), 1.0);
    }

    #[test]
    fn test_report_serializes_as_map() {
        let report = ReconciliationReport::new(3, 4, Duration::from_millis(1500))
            .with_metadata("chunk_size", 2);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["match_rate"], 0.75);
        assert_eq!(value["rows_compared"], 4);
        assert_eq!(value["metadata"]["chunk_size"], 2);

        let parsed: ReconciliationReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.mismatched_rows(), 1);
    }
}
