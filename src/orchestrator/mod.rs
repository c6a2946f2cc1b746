//! Orchestrator module: high-level workflow coordination.
//!
//! `run_merge` loads both tables, reconciles them, writes the unified table and
//! reports a [`summary::RunSummary`]. `run_cdps` drives the place-population export.
//! Any load or write failure aborts the run before an output file is put in place.

pub mod summary;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};

use crate::census::fetch::{fetch_place_table, read_place_table};
use crate::census::{parse_place_table, select_cdps};
use crate::config::{AppConfig, CensusConfig};
use crate::export::{export_cdps_csv, export_summary_csv, export_unified_csv};
use crate::matching::{OutcomeTally, ReconcileEvent, reconcile};
use crate::source::{load_legacy_csv, load_snapshot_csv};
use summary::{RunSummary, SummaryBuilder};

/// Full merge run. `observe` sees every reconciliation event.
pub fn run_merge<F>(cfg: &AppConfig, mut observe: F) -> Result<RunSummary>
where
    F: FnMut(&ReconcileEvent),
{
    cfg.validate().context("Invalid configuration")?;
    let started = Utc::now();
    let legacy_path = &cfg.inputs.legacy_path;
    let snapshot_path = &cfg.inputs.snapshot_path;
    let title = cfg.matching.title_case;

    info!("Loading data...");
    let legacy = load_legacy_csv(legacy_path, &cfg.columns.legacy, title)
        .with_context(|| format!("Failed to load legacy table {}", legacy_path.display()))?;
    let snapshot = load_snapshot_csv(snapshot_path, &cfg.columns.snapshot, title)
        .with_context(|| format!("Failed to load snapshot table {}", snapshot_path.display()))?;
    info!(
        "Loaded {} legacy rows ({} year columns) and {} snapshot rows",
        legacy.records.len(),
        legacy.years.len(),
        snapshot.len()
    );

    let opts = cfg.matching.reconcile_options();
    let mut tally = OutcomeTally::default();
    let outcome = reconcile(&legacy, &snapshot, &opts, |e| {
        tally.observe(&e);
        observe(&e);
    });
    debug!(
        "Conflicted keys: {} legacy, {} snapshot",
        outcome.conflicted_legacy, outcome.conflicted_snapshot
    );
    let table = outcome.table;

    info!("Saving merged dataset...");
    export_unified_csv(&cfg.output.out_path, &table)?;

    let summary = SummaryBuilder::new(
        &legacy_path.display().to_string(),
        &snapshot_path.display().to_string(),
        &cfg.output.out_path.display().to_string(),
    )
    .with_counts(legacy.records.len(), snapshot.len())
    .with_conflicts(outcome.conflicted_legacy, outcome.conflicted_snapshot)
    .with_tally(tally)
    .with_output(table.rows.len(), opts.snapshot_year, table.year_range())
    .with_timestamps(started, Utc::now())
    .build();

    if let Some(path) = &cfg.output.summary_path {
        export_summary_csv(path, &summary)?;
        info!("Summary written to {}", path.display());
    }
    Ok(summary)
}

/// Place-population export: fetch (or read), filter, sort, write. Returns the row count.
pub async fn run_cdps(cfg: &CensusConfig) -> Result<usize> {
    let payload = match &cfg.from_file {
        Some(path) => read_place_table(path)?,
        None => fetch_place_table(&cfg.url, Duration::from_secs(cfg.timeout_secs))
            .await
            .context("Failed to fetch the census place table")?,
    };
    let rows = parse_place_table(&payload).context("Unexpected place table format")?;
    let total = rows.len();
    let cdps = select_cdps(rows, cfg.min_population);
    export_cdps_csv(&cfg.out_path, &cdps)?;
    info!(
        "Done. Rows: {} of {} -> {}",
        cdps.len(),
        total,
        cfg.out_path.display()
    );
    Ok(cdps.len())
}
