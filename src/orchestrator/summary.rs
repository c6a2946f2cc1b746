//! Run summary report.

use chrono::{DateTime, Utc};
use log::info;

use crate::matching::OutcomeTally;
use crate::models::Year;

/// Final report of a merge run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub legacy_path: String,
    pub snapshot_path: String,
    pub out_path: String,
    pub snapshot_year: Year,
    pub total_legacy: usize,
    pub total_snapshot: usize,
    pub conflicted_legacy: usize,
    pub conflicted_snapshot: usize,
    pub tally: OutcomeTally,
    pub output_rows: usize,
    pub year_range: Option<(Year, Year)>,
    pub started_utc: DateTime<Utc>,
    pub ended_utc: DateTime<Utc>,
    pub duration_secs: f64,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            "Loaded {} legacy rows and {} snapshot rows",
            self.total_legacy, self.total_snapshot
        );
        info!(
            "Matched {} legacy rows ({} by city/state, {} by county); {} unmatched",
            self.tally.matched(),
            self.tally.matched_by_name,
            self.tally.matched_by_county,
            self.tally.unmatched_legacy()
        );
        info!("Total new cities added: {}", self.tally.added);
        if let Some((first, last)) = self.year_range {
            info!(
                "Merged dataset saved to {} ({} rows, {}-{}) in {:.2}s",
                self.out_path, self.output_rows, first, last, self.duration_secs
            );
        }
    }
}

/// Builder for RunSummary to simplify summary creation.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    legacy_path: String,
    snapshot_path: String,
    out_path: String,
    snapshot_year: Year,
    total_legacy: usize,
    total_snapshot: usize,
    conflicted_legacy: usize,
    conflicted_snapshot: usize,
    tally: OutcomeTally,
    output_rows: usize,
    year_range: Option<(Year, Year)>,
    started_utc: DateTime<Utc>,
    ended_utc: DateTime<Utc>,
}

impl SummaryBuilder {
    /// Start a summary for the given inputs and output; the start time is now.
    pub fn new(legacy_path: &str, snapshot_path: &str, out_path: &str) -> Self {
        let now = Utc::now();
        Self {
            legacy_path: legacy_path.to_string(),
            snapshot_path: snapshot_path.to_string(),
            out_path: out_path.to_string(),
            snapshot_year: 0,
            total_legacy: 0,
            total_snapshot: 0,
            conflicted_legacy: 0,
            conflicted_snapshot: 0,
            tally: OutcomeTally::default(),
            output_rows: 0,
            year_range: None,
            started_utc: now,
            ended_utc: now,
        }
    }

    pub fn with_counts(mut self, legacy: usize, snapshot: usize) -> Self {
        self.total_legacy = legacy;
        self.total_snapshot = snapshot;
        self
    }

    pub fn with_conflicts(mut self, legacy: usize, snapshot: usize) -> Self {
        self.conflicted_legacy = legacy;
        self.conflicted_snapshot = snapshot;
        self
    }

    pub fn with_tally(mut self, tally: OutcomeTally) -> Self {
        self.tally = tally;
        self
    }

    pub fn with_output(mut self, rows: usize, snapshot_year: Year, years: Option<(Year, Year)>) -> Self {
        self.output_rows = rows;
        self.snapshot_year = snapshot_year;
        self.year_range = years;
        self
    }

    pub fn with_timestamps(mut self, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        self.started_utc = started;
        self.ended_utc = ended;
        self
    }

    pub fn build(self) -> RunSummary {
        let duration_secs = (self.ended_utc - self.started_utc).num_milliseconds() as f64 / 1000.0;
        RunSummary {
            legacy_path: self.legacy_path,
            snapshot_path: self.snapshot_path,
            out_path: self.out_path,
            snapshot_year: self.snapshot_year,
            total_legacy: self.total_legacy,
            total_snapshot: self.total_snapshot,
            conflicted_legacy: self.conflicted_legacy,
            conflicted_snapshot: self.conflicted_snapshot,
            tally: self.tally,
            output_rows: self.output_rows,
            year_range: self.year_range,
            started_utc: self.started_utc,
            ended_utc: self.ended_utc,
            duration_secs,
        }
    }
}
