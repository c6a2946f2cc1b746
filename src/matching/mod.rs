//! Reconciliation of the legacy table against the census snapshot.
//!
//! - `grouper`: (normalized city, state) buckets and conflict status per dataset
//! - `matcher`: legacy -> snapshot resolution
//! - `appender`: snapshot rows with no legacy counterpart
//!
//! Decisions are reported through a caller-supplied callback receiving
//! [`ReconcileEvent`]s; nothing in this module prints.

pub mod appender;
pub mod grouper;
mod helpers;
pub mod matcher;

use log::{info, warn};

use crate::assemble::{UnifiedTable, assemble};
use crate::models::{LegacyTable, NewRecord, Year};
use appender::{AppendPolicy, append_new};
use matcher::{MatchContext, match_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Matching,
    Appending,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Matching => "legacy row",
            Self::Appending => "snapshot row",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Emit a progress event every N rows; 0 disables the periodic ticks.
    pub update_every: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { update_every: 1000 }
    }
}

impl ProgressConfig {
    pub(crate) fn is_tick(&self, idx: usize) -> bool {
        self.update_every > 0 && idx % self.update_every == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: Stage,
    pub processed: usize,
    pub total: usize,
}

impl ProgressUpdate {
    pub fn new(stage: Stage, processed: usize, total: usize) -> Self {
        Self {
            stage,
            processed,
            total,
        }
    }

    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f32 * 100.0 / self.total as f32
        }
    }
}

/// One observable decision (or progress tick) of the reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileEvent {
    Progress(ProgressUpdate),
    MatchedByName {
        city: String,
        state: String,
        population: Option<u64>,
    },
    MatchedByCounty {
        city: String,
        state: String,
        county: String,
        population: Option<u64>,
    },
    NoMatch {
        city: String,
        state: String,
    },
    NoCountyMatch {
        city: String,
        state: String,
        county: String,
    },
    Ambiguous {
        city: String,
        state: String,
        candidates: usize,
    },
    Added {
        city: String,
        state: String,
        population: u64,
    },
    AlreadyPresent {
        city: String,
        state: String,
    },
    BelowThreshold {
        city: String,
        state: String,
        population: Option<u64>,
    },
}

/// Per-outcome counters accumulated from events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub matched_by_name: usize,
    pub matched_by_county: usize,
    pub no_match: usize,
    pub no_county_match: usize,
    pub ambiguous: usize,
    pub added: usize,
    pub already_present: usize,
    pub below_threshold: usize,
}

impl OutcomeTally {
    pub fn observe(&mut self, event: &ReconcileEvent) {
        match event {
            ReconcileEvent::Progress(_) => {}
            ReconcileEvent::MatchedByName { .. } => self.matched_by_name += 1,
            ReconcileEvent::MatchedByCounty { .. } => self.matched_by_county += 1,
            ReconcileEvent::NoMatch { .. } => self.no_match += 1,
            ReconcileEvent::NoCountyMatch { .. } => self.no_county_match += 1,
            ReconcileEvent::Ambiguous { .. } => self.ambiguous += 1,
            ReconcileEvent::Added { .. } => self.added += 1,
            ReconcileEvent::AlreadyPresent { .. } => self.already_present += 1,
            ReconcileEvent::BelowThreshold { .. } => self.below_threshold += 1,
        }
    }

    pub fn matched(&self) -> usize {
        self.matched_by_name + self.matched_by_county
    }

    pub fn unmatched_legacy(&self) -> usize {
        self.no_match + self.no_county_match + self.ambiguous
    }
}

/// Renders events as human-readable audit lines through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn report(&self, event: &ReconcileEvent) {
        match event {
            ReconcileEvent::Progress(p) => info!(
                "Processing {} {}/{} ({:.1}%)",
                p.stage.label(),
                p.processed,
                p.total,
                p.percent()
            ),
            ReconcileEvent::MatchedByName { city, state, .. } => {
                info!("Matched {}, {} by city/state.", city, state)
            }
            ReconcileEvent::MatchedByCounty {
                city,
                state,
                county,
                ..
            } => info!("Matched {}, {} by county ({}).", city, state, county),
            ReconcileEvent::NoMatch { city, state } => info!("No match for {}, {}.", city, state),
            ReconcileEvent::NoCountyMatch {
                city,
                state,
                county,
            } => info!(
                "No county match for {}, {} (county: {}).",
                city, state, county
            ),
            ReconcileEvent::Ambiguous {
                city,
                state,
                candidates,
            } => warn!(
                "Ambiguous match for {}, {} ({} candidates, no conflict detected).",
                city, state, candidates
            ),
            ReconcileEvent::Added {
                city,
                state,
                population,
            } => info!(
                "Adding new city: {}, {} (Population: {})",
                city, state, population
            ),
            ReconcileEvent::AlreadyPresent { .. } => {}
            ReconcileEvent::BelowThreshold {
                city,
                state,
                population,
            } => info!(
                "Not adding {}, {}: population {} at or below threshold",
                city,
                state,
                population
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "unknown".into())
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub snapshot_year: Year,
    pub append_threshold: u64,
    pub progress: ProgressConfig,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        let policy = AppendPolicy::default();
        Self {
            snapshot_year: policy.snapshot_year,
            append_threshold: policy.threshold,
            progress: ProgressConfig::default(),
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub table: UnifiedTable,
    /// Conflicted (normalized city, state) keys in the legacy table.
    pub conflicted_legacy: usize,
    /// Conflicted keys in the snapshot.
    pub conflicted_snapshot: usize,
}

/// Match, then append, then assemble. The appender only sees the original legacy rows.
pub fn reconcile<F>(
    legacy: &LegacyTable,
    snapshot: &[NewRecord],
    opts: &ReconcileOptions,
    mut on_event: F,
) -> Reconciliation
where
    F: FnMut(ReconcileEvent),
{
    let ctx = MatchContext::new(&legacy.records, snapshot);
    let outcomes = match_with(&ctx, &legacy.records, opts.progress, &mut on_event);
    let appended = append_new(
        &legacy.records,
        snapshot,
        AppendPolicy {
            threshold: opts.append_threshold,
            snapshot_year: opts.snapshot_year,
        },
        opts.progress,
        &mut on_event,
    );
    Reconciliation {
        table: assemble(legacy, &outcomes, appended, opts.snapshot_year),
        conflicted_legacy: ctx.legacy_conflicts().conflicted_count(),
        conflicted_snapshot: ctx.snapshot_conflicts().conflicted_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LegacyRecord;

    #[test]
    fn st_louis_end_to_end() {
        let legacy = LegacyTable {
            years: vec![1950],
            records: vec![LegacyRecord::new("St. Louis", "MO", Some("St Louis"))
                .with_population(1950, 800_000)],
        };
        let snap = vec![NewRecord::new("Saint Louis", "MO", "St Louis", Some(300_000))];
        let mut tally = OutcomeTally::default();
        let t = reconcile(&legacy, &snap, &ReconcileOptions::default(), |e| {
            tally.observe(&e)
        })
        .table;
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].city, "St. Louis");
        assert_eq!(t.rows[0].populations.get(&1950), Some(&800_000));
        assert_eq!(t.rows[0].populations.get(&2020), Some(&300_000));
        assert_eq!(t.years, vec![1950, 2020]);
        assert_eq!(tally.matched_by_name, 1);
        assert_eq!(tally.already_present, 1);
        assert_eq!(tally.added, 0);
    }

    #[test]
    fn appended_rows_follow_legacy_rows() {
        let legacy = LegacyTable {
            years: vec![1900],
            records: vec![
                LegacyRecord::new("Galveston", "TX", Some("Galveston")).with_population(1900, 37_789),
                LegacyRecord::new("Jefferson", "TX", Some("Marion")).with_population(1900, 2_850),
            ],
        };
        let snap = vec![
            NewRecord::new("Frisco", "TX", "Collin, Denton", Some(200_509)),
            NewRecord::new("Galveston", "TX", "Galveston", Some(53_695)),
            NewRecord::new("Tiny", "TX", "Loving", Some(64)),
        ];
        let mut events = Vec::new();
        let t = reconcile(&legacy, &snap, &ReconcileOptions::default(), |e| {
            events.push(e)
        })
        .table;
        let cities: Vec<&str> = t.rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Galveston", "Jefferson", "Frisco"]);
        assert_eq!(t.rows[1].populations.get(&2020), None);
        assert_eq!(t.rows[2].populations.get(&1900), None);

        let mut tally = OutcomeTally::default();
        events.iter().for_each(|e| tally.observe(e));
        assert_eq!(tally.matched(), 1);
        assert_eq!(tally.unmatched_legacy(), 1);
        assert_eq!(tally.added, 1);
        assert_eq!(tally.below_threshold, 1);
    }

    #[test]
    fn custom_threshold_and_year() {
        let legacy = LegacyTable::default();
        let snap = vec![NewRecord::new("Hamlet", "VT", "Orange", Some(800))];
        let opts = ReconcileOptions {
            snapshot_year: 2030,
            append_threshold: 500,
            progress: ProgressConfig { update_every: 0 },
        };
        let mut events = Vec::new();
        let t = reconcile(&legacy, &snap, &opts, |e| events.push(e)).table;
        assert_eq!(t.years, vec![2030]);
        assert_eq!(t.rows[0].populations.get(&2030), Some(&800));
        // only the two final ticks when periodic progress is disabled
        let ticks = events
            .iter()
            .filter(|e| matches!(e, ReconcileEvent::Progress(_)))
            .count();
        assert_eq!(ticks, 2);
    }

    #[test]
    fn conflict_counts_come_from_the_same_pass() {
        let legacy = LegacyTable {
            years: vec![1950],
            records: vec![
                LegacyRecord::new("Franklin", "PA", Some("Venango")),
                LegacyRecord::new("Franklin City", "PA", Some("Venango")),
                LegacyRecord::new("Erie", "PA", Some("Erie")),
            ],
        };
        let snap = vec![
            NewRecord::new("St. Louis", "MO", "St Louis", Some(300_000)),
            NewRecord::new("Saint Louis", "MO", "St Louis City", Some(1_000)),
            NewRecord::new("Erie", "PA", "Erie", Some(94_000)),
        ];
        let r = reconcile(&legacy, &snap, &ReconcileOptions::default(), |_| {});
        assert_eq!(r.conflicted_legacy, 1);
        assert_eq!(r.conflicted_snapshot, 1);
        assert_eq!(r.table.rows[2].populations.get(&2020), Some(&94_000));
    }

    #[test]
    fn progress_percent() {
        assert_eq!(ProgressUpdate::new(Stage::Matching, 0, 0).percent(), 100.0);
        assert_eq!(ProgressUpdate::new(Stage::Matching, 50, 200).percent(), 25.0);
    }
}
