//! Tally CLI - Command-line interface for the reconciliation engine

mod bench;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_connectors::default_registry;
use tally_core::{ReconcileOptions, ReconciliationEngine};
use tally_evidence::{ResultEntry, ResultStore};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::bench::{run_repeated, BenchOutcome, ChunkChoice};
use crate::config::{load_tuned_chunk_size, CliConfig};

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Row-level table reconciliation - measure how many rows two tables agree on")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile two tables and record the result
    Run(RunArgs),

    /// List stored results
    Results {
        /// Result store path [env: TALLY_RESULTS_PATH]
        #[arg(long)]
        results: Option<PathBuf>,

        /// Print the raw JSON store
        #[arg(long)]
        json: bool,
    },

    /// Delete the result store
    Wipe {
        /// Result store path [env: TALLY_RESULTS_PATH]
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Left table (Parquet or CSV path, or file:// URI)
    #[arg(long)]
    left: String,

    /// Right table (Parquet or CSV path, or file:// URI)
    #[arg(long)]
    right: String,

    /// Name to store the result under (default: full, streaming or tuned)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Rows per chunk; omit to compare whole tables in one pass
    #[arg(long, conflicts_with = "tuned")]
    chunk_size: Option<usize>,

    /// Use the chunk size from the tuning file [env: TALLY_TUNING_PATH]
    #[arg(long)]
    tuned: bool,

    /// Comma-separated columns to compare instead of all shared columns
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Repetitions to average [env: TALLY_RUNS]
    #[arg(long)]
    runs: Option<usize>,

    /// Threads comparing chunks [env: TALLY_WORKERS]
    #[arg(long)]
    workers: Option<usize>,

    /// Result store path [env: TALLY_RESULTS_PATH]
    #[arg(long)]
    results: Option<PathBuf>,

    /// Do not record the result
    #[arg(long)]
    no_store: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = CliConfig::from_env()?;

    match cli.command {
        Commands::Run(args) => {
            run_reconciliation(&config, args)?;
        }
        Commands::Results { results, json } => {
            show_results(&ResultStore::new(results.unwrap_or(config.results_path)), json)?;
        }
        Commands::Wipe { results } => {
            let store = ResultStore::new(results.unwrap_or(config.results_path));
            if store.wipe()? {
                println!("Deleted {}", store.path().display());
            } else {
                println!("Nothing to delete at {}", store.path().display());
            }
        }
    }

    Ok(())
}

fn run_reconciliation(config: &CliConfig, args: RunArgs) -> Result<()> {
    let registry = default_registry();
    let left = registry
        .open(&args.left)
        .with_context(|| format!("Failed to open left table {}", args.left))?;
    let right = registry
        .open(&args.right)
        .with_context(|| format!("Failed to open right table {}", args.right))?;

    let choice = if args.tuned {
        ChunkChoice::Tuned(load_tuned_chunk_size(
            &config.tuning_path,
            config.default_chunk_size,
        ))
    } else {
        match args.chunk_size {
            Some(n) if n > 0 => ChunkChoice::Fixed(n),
            _ => ChunkChoice::Whole,
        }
    };

    let options = ReconcileOptions {
        chunk_size: choice.chunk_size(),
        columns: args.columns,
        workers: args.workers.unwrap_or(config.workers),
        cancel: None,
    };
    let runs = args.runs.unwrap_or(config.runs);
    let strategy = args
        .strategy
        .unwrap_or_else(|| choice.default_strategy().to_string());

    info!(
        "Running strategy '{}' ({} runs): {} vs {}",
        strategy, runs, args.left, args.right
    );
    let engine = ReconciliationEngine::new(options);
    let outcome = run_repeated(&engine, left.as_ref(), right.as_ref(), runs)?;
    print_outcome(&strategy, &outcome);

    if !args.no_store {
        let store = ResultStore::new(args.results.unwrap_or_else(|| config.results_path.clone()));
        store.put(ResultEntry::new(
            &strategy,
            &outcome.report,
            outcome.runs,
            outcome.mean_elapsed,
        ))?;
        println!("Stored as '{}' in {}", strategy, store.path().display());
    }

    Ok(())
}

fn print_outcome(strategy: &str, outcome: &BenchOutcome) {
    let report = &outcome.report;
    println!("\n=== Reconciliation Report ===");
    println!("Strategy:   {}", strategy);
    println!("Rows:       {}", report.rows_compared);
    println!("Matched:    {}", report.matched_rows);
    println!("Mismatched: {}", report.mismatched_rows());
    println!("Match Rate: {:.10}", report.match_rate);
    println!(
        "Time Taken: {:.4}s (mean of {} runs)",
        outcome.mean_elapsed.as_secs_f64(),
        outcome.runs
    );
}

fn show_results(store: &ResultStore, json: bool) -> Result<()> {
    let entries = store.get_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No results stored in {}", store.path().display());
        return Ok(());
    }

    println!("\n=== Reconciliation Results ===");
    for entry in entries.values() {
        let chunking = entry
            .chunk_size
            .map(|n| n.to_string())
            .unwrap_or_else(|| "whole table".to_string());
        println!();
        println!("{}:", entry.strategy);
        println!("  Match Rate: {:.10}", entry.match_rate);
        println!("  Time Taken: {:.4}s (mean of {} runs)", entry.time_taken_sec, entry.runs);
        println!("  Rows:       {} ({} matched)", entry.rows_compared, entry.matched_rows);
        println!("  Chunk Size: {}", chunking);
        println!("  Recorded:   {} ({})", entry.recorded_at, entry.run_id);
    }

    Ok(())
}
