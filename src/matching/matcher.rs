//! Legacy -> snapshot matching.
//!
//! Every legacy record is visited once and resolved against the snapshot rows that share
//! its (normalized city, state). A key that is conflicted in either dataset needs a
//! county match; otherwise a single candidate is adopted directly.

use crate::matching::grouper::{ConflictIndex, PlaceIndex};
use crate::matching::helpers::county_in;
use crate::matching::{ProgressConfig, ProgressUpdate, ReconcileEvent, Stage};
use crate::models::{LegacyRecord, NewRecord, PlaceKey};

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Sole candidate, no conflict in either dataset.
    ByName {
        candidate: usize,
        population: Option<u64>,
    },
    /// First candidate whose counties field contains the legacy county.
    ByCounty {
        candidate: usize,
        population: Option<u64>,
    },
    NoCandidates,
    /// Conflicted key and no candidate carries the legacy county (or it has none).
    NoCountyMatch,
    /// Several candidates while neither dataset reports a conflict.
    Ambiguous { candidates: usize },
}

impl MatchOutcome {
    /// Snapshot population adopted by the legacy record, if any.
    pub fn population(&self) -> Option<u64> {
        match self {
            Self::ByName { population, .. } | Self::ByCounty { population, .. } => *population,
            _ => None,
        }
    }

    pub fn candidate(&self) -> Option<usize> {
        match self {
            Self::ByName { candidate, .. } | Self::ByCounty { candidate, .. } => Some(*candidate),
            _ => None,
        }
    }
}

/// Indices over the unmodified inputs, built once before the pass.
#[derive(Debug)]
pub struct MatchContext<'a> {
    snapshot: &'a [NewRecord],
    candidates: PlaceIndex,
    legacy_conflicts: ConflictIndex,
    snapshot_conflicts: ConflictIndex,
}

impl<'a> MatchContext<'a> {
    pub fn new(legacy: &[LegacyRecord], snapshot: &'a [NewRecord]) -> Self {
        Self {
            snapshot,
            candidates: PlaceIndex::build(snapshot),
            legacy_conflicts: ConflictIndex::build(legacy),
            snapshot_conflicts: ConflictIndex::build(snapshot),
        }
    }

    pub fn legacy_conflicts(&self) -> &ConflictIndex {
        &self.legacy_conflicts
    }

    pub fn snapshot_conflicts(&self) -> &ConflictIndex {
        &self.snapshot_conflicts
    }

    /// Resolve one legacy record. Pure: reads only the indices and `record`.
    pub fn resolve(&self, record: &LegacyRecord) -> MatchOutcome {
        let (key, state) = (record.norm_city(), record.state());
        let cands = self.candidates.get(key, state);
        if cands.is_empty() {
            return MatchOutcome::NoCandidates;
        }
        let conflicted = self.legacy_conflicts.is_conflicted(key, state)
            || self.snapshot_conflicts.is_conflicted(key, state);
        if conflicted {
            let Some(county) = record.county_hint() else {
                return MatchOutcome::NoCountyMatch;
            };
            return cands
                .iter()
                .copied()
                .find(|&i| county_in(&self.snapshot[i].counties, county))
                .map(|i| MatchOutcome::ByCounty {
                    candidate: i,
                    population: self.snapshot[i].population,
                })
                .unwrap_or(MatchOutcome::NoCountyMatch);
        }
        match cands {
            [only] => MatchOutcome::ByName {
                candidate: *only,
                population: self.snapshot[*only].population,
            },
            many => MatchOutcome::Ambiguous {
                candidates: many.len(),
            },
        }
    }
}

fn outcome_event(record: &LegacyRecord, outcome: &MatchOutcome) -> ReconcileEvent {
    let city = record.city.clone();
    let state = record.state.clone();
    match outcome {
        MatchOutcome::ByName { population, .. } => ReconcileEvent::MatchedByName {
            city,
            state,
            population: *population,
        },
        MatchOutcome::ByCounty { population, .. } => ReconcileEvent::MatchedByCounty {
            city,
            state,
            county: record.county_hint().unwrap_or_default().to_string(),
            population: *population,
        },
        MatchOutcome::NoCandidates => ReconcileEvent::NoMatch { city, state },
        MatchOutcome::NoCountyMatch => ReconcileEvent::NoCountyMatch {
            city,
            state,
            county: record.county_hint().unwrap_or_default().to_string(),
        },
        MatchOutcome::Ambiguous { candidates } => ReconcileEvent::Ambiguous {
            city,
            state,
            candidates: *candidates,
        },
    }
}

/// Match every legacy record, returning one outcome per record in input order.
pub fn match_legacy<F>(
    legacy: &[LegacyRecord],
    snapshot: &[NewRecord],
    progress: ProgressConfig,
    on_event: F,
) -> Vec<MatchOutcome>
where
    F: FnMut(ReconcileEvent),
{
    let ctx = MatchContext::new(legacy, snapshot);
    match_with(&ctx, legacy, progress, on_event)
}

/// Same pass as [`match_legacy`] over indices the caller already built.
pub fn match_with<F>(
    ctx: &MatchContext<'_>,
    legacy: &[LegacyRecord],
    progress: ProgressConfig,
    mut on_event: F,
) -> Vec<MatchOutcome>
where
    F: FnMut(ReconcileEvent),
{
    let total = legacy.len();
    let mut out = Vec::with_capacity(total);
    for (idx, record) in legacy.iter().enumerate() {
        if progress.is_tick(idx) {
            on_event(ReconcileEvent::Progress(ProgressUpdate::new(
                Stage::Matching,
                idx,
                total,
            )));
        }
        let outcome = ctx.resolve(record);
        on_event(outcome_event(record, &outcome));
        out.push(outcome);
    }
    on_event(ReconcileEvent::Progress(ProgressUpdate::new(
        Stage::Matching,
        total,
        total,
    )));
    out
}
