//! Repeated reconciliation runs with averaged timing

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tally_core::{ReconciliationEngine, ReconciliationReport, TableSource};
use tracing::info;

/// How the tables are cut into chunks for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkChoice {
    Whole,
    Fixed(usize),
    Tuned(usize),
}

impl ChunkChoice {
    pub fn chunk_size(self) -> Option<usize> {
        match self {
            ChunkChoice::Whole => None,
            ChunkChoice::Fixed(n) | ChunkChoice::Tuned(n) => Some(n),
        }
    }

    /// Name a result is stored under when the user gives none.
    pub fn default_strategy(self) -> &'static str {
        match self {
            ChunkChoice::Whole => "full",
            ChunkChoice::Fixed(_) => "streaming",
            ChunkChoice::Tuned(_) => "tuned",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchOutcome {
    /// Report of the first repetition
    pub report: ReconciliationReport,
    pub runs: usize,
    pub mean_elapsed: Duration,
}

/// Reconcile `runs` times. Every repetition must reproduce the first match rate.
pub fn run_repeated(
    engine: &ReconciliationEngine,
    left: &dyn TableSource,
    right: &dyn TableSource,
    runs: usize,
) -> Result<BenchOutcome> {
    if runs == 0 {
        bail!("At least one run is required");
    }
    let divisor = u32::try_from(runs).context("Too many runs to average")?;

    let first = engine.reconcile(left, right)?;
    let mut total = first.elapsed;
    info!("Run 1/{}: {:?}", runs, first.elapsed);

    for run in 2..=runs {
        let report = engine.reconcile(left, right)?;
        if report.match_rate != first.match_rate {
            bail!(
                "Run {} produced match rate {:.10}, run 1 produced {:.10}",
                run,
                report.match_rate,
                first.match_rate
            );
        }
        total += report.elapsed;
        info!("Run {}/{}: {:?}", run, runs, report.elapsed);
    }

    Ok(BenchOutcome {
        report: first,
        runs,
        mean_elapsed: total / divisor,
    })
}
