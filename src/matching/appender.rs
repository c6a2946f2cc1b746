//! Snapshot rows that have no legacy counterpart become new unified rows.
//!
//! The "already present" test accepts ANY legacy entry whose county appears in the
//! snapshot row's counties field, whereas the matcher takes the FIRST county-matching
//! candidate and stops. The two rules are kept separate on purpose.

use std::collections::BTreeMap;

use crate::matching::grouper::PlaceIndex;
use crate::matching::helpers::county_in;
use crate::matching::{ProgressConfig, ProgressUpdate, ReconcileEvent, Stage};
use crate::models::{LegacyRecord, NewRecord, PlaceKey, UnifiedRecord, Year};

/// Default minimum population (exclusive) for a synthesized row.
pub const APPEND_THRESHOLD: u64 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendPolicy {
    /// Rows are added only when population is strictly greater than this.
    pub threshold: u64,
    /// Year column that receives the snapshot population.
    pub snapshot_year: Year,
}

impl Default for AppendPolicy {
    fn default() -> Self {
        Self {
            threshold: APPEND_THRESHOLD,
            snapshot_year: 2020,
        }
    }
}

/// Whether `record` is already represented by one of the `possible` legacy entries,
/// all of which share its (normalized city, state).
pub fn already_present(possible: &[&LegacyRecord], record: &NewRecord) -> bool {
    match possible {
        [] => false,
        [_] => true,
        many => many.iter().any(|l| {
            l.county_hint()
                .is_some_and(|county| county_in(&record.counties, county))
        }),
    }
}

fn synthesize(record: &NewRecord, population: u64, year: Year) -> UnifiedRecord {
    let mut populations = BTreeMap::new();
    populations.insert(year, population);
    UnifiedRecord {
        city: record.city.clone(),
        state: record.state.clone(),
        county: Some(record.counties.clone()),
        populations,
        latitude: record.latitude,
        longitude: record.longitude,
    }
}

/// Scan the snapshot in order and build the rows to append after the legacy rows.
pub fn append_new<F>(
    legacy: &[LegacyRecord],
    snapshot: &[NewRecord],
    policy: AppendPolicy,
    progress: ProgressConfig,
    mut on_event: F,
) -> Vec<UnifiedRecord>
where
    F: FnMut(ReconcileEvent),
{
    let index = PlaceIndex::build(legacy);
    let total = snapshot.len();
    let mut out = Vec::new();
    for (idx, record) in snapshot.iter().enumerate() {
        if progress.is_tick(idx) {
            on_event(ReconcileEvent::Progress(ProgressUpdate::new(
                Stage::Appending,
                idx,
                total,
            )));
        }
        let possible: Vec<&LegacyRecord> = index
            .get(record.norm_city(), record.state())
            .iter()
            .map(|&i| &legacy[i])
            .collect();
        if already_present(&possible, record) {
            on_event(ReconcileEvent::AlreadyPresent {
                city: record.city.clone(),
                state: record.state.clone(),
            });
            continue;
        }
        match record.population {
            Some(pop) if pop > policy.threshold => {
                on_event(ReconcileEvent::Added {
                    city: record.city.clone(),
                    state: record.state.clone(),
                    population: pop,
                });
                out.push(synthesize(record, pop, policy.snapshot_year));
            }
            population => on_event(ReconcileEvent::BelowThreshold {
                city: record.city.clone(),
                state: record.state.clone(),
                population,
            }),
        }
    }
    on_event(ReconcileEvent::Progress(ProgressUpdate::new(
        Stage::Appending,
        total,
        total,
    )));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::{MatchContext, MatchOutcome};

    fn run(legacy: &[LegacyRecord], snap: &[NewRecord]) -> Vec<UnifiedRecord> {
        append_new(
            legacy,
            snap,
            AppendPolicy::default(),
            ProgressConfig::default(),
            |_| {},
        )
    }

    #[test]
    fn single_legacy_match_never_duplicated() {
        let legacy = vec![LegacyRecord::new("St. Louis", "MO", Some("St Louis"))];
        let snap = vec![NewRecord::new("Saint Louis", "MO", "Elsewhere", Some(300_000))];
        assert!(run(&legacy, &snap).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let legacy: Vec<LegacyRecord> = vec![];
        let snap = vec![
            NewRecord::new("Bigtown", "TX", "Harris", Some(3_000)),
            NewRecord::new("Smallville", "TX", "Harris", Some(2_000)),
            NewRecord::new("Edge", "TX", "Harris", Some(2_500)),
            NewRecord::new("Blank", "TX", "Harris", None),
        ];
        let out = run(&legacy, &snap);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].city, "Bigtown");
    }

    #[test]
    fn synthesized_row_carries_snapshot_fields() {
        let snap = vec![
            NewRecord::new("Enterprise", "NV", "Clark", Some(221_831))
                .with_coordinates(Some(36.025), Some(-115.241)),
        ];
        let out = run(&[], &snap);
        assert_eq!(out.len(), 1);
        let r = &out[0];
        assert_eq!(r.state, "NV");
        assert_eq!(r.county.as_deref(), Some("Clark"));
        assert_eq!(r.populations.len(), 1);
        assert_eq!(r.populations.get(&2020), Some(&221_831));
        assert_eq!(r.latitude, Some(36.025));
        assert_eq!(r.longitude, Some(-115.241));
    }

    #[test]
    fn multiple_legacy_entries_need_county() {
        let legacy = vec![
            LegacyRecord::new("Franklin", "PA", Some("Venango")),
            LegacyRecord::new("Franklin", "PA", None),
        ];
        let found = vec![NewRecord::new("Franklin City", "PA", "Venango County", Some(6_000))];
        let missing = vec![NewRecord::new("Franklin", "PA", "Cambria County", Some(4_000))];
        assert!(run(&legacy, &found).is_empty());
        let out = run(&legacy, &missing);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].county.as_deref(), Some("Cambria County"));
    }

    #[test]
    fn already_present_any_entry() {
        let a = LegacyRecord::new("Dover", "NJ", Some("Morris"));
        let b = LegacyRecord::new("Dover", "NJ", Some("Ocean"));
        let rec = NewRecord::new("Dover", "NJ", "Ocean County", Some(40_000));
        assert!(already_present(&[&a, &b], &rec));
        assert!(already_present(&[&a], &rec));
        assert!(!already_present(&[], &rec));
    }

    // Pins the first-versus-any asymmetry between matching and appending: a snapshot
    // row can be "already present" through a legacy entry that the matcher never pairs
    // with it.
    #[test]
    fn matcher_first_vs_appender_any() {
        let legacy = vec![
            LegacyRecord::new("Dover", "NJ", Some("Morris")),
            LegacyRecord::new("Dover", "NJ", Some("Sussex")),
        ];
        let snap = vec![
            NewRecord::new("Dover", "NJ", "Morris, Sussex", Some(18_000)),
            NewRecord::new("Dover", "NJ", "Sussex", Some(5_000)),
        ];
        let ctx = MatchContext::new(&legacy, &snap);
        // Both legacy rows pick the first candidate naming their county.
        assert_eq!(ctx.resolve(&legacy[0]).candidate(), Some(0));
        assert_eq!(ctx.resolve(&legacy[1]).candidate(), Some(0));
        assert!(matches!(ctx.resolve(&legacy[1]), MatchOutcome::ByCounty { .. }));
        // The second snapshot row got no legacy partner yet is not appended.
        assert!(run(&legacy, &snap).is_empty());
    }

    #[test]
    fn events_name_every_place() {
        let legacy = vec![LegacyRecord::new("Austin", "TX", Some("Travis"))];
        let snap = vec![
            NewRecord::new("Austin", "TX", "Travis", Some(961_855)),
            NewRecord::new("Pflugerville", "TX", "Travis", Some(65_191)),
            NewRecord::new("Manor", "TX", "Travis", Some(1_000)),
        ];
        let mut events = Vec::new();
        let out = append_new(
            &legacy,
            &snap,
            AppendPolicy::default(),
            ProgressConfig { update_every: 2 },
            |e| events.push(e),
        );
        assert_eq!(out.len(), 1);
        let progress = events
            .iter()
            .filter(|e| matches!(e, ReconcileEvent::Progress(_)))
            .count();
        // ticks at rows 0 and 2, plus the final one
        assert_eq!(progress, 3);
        assert!(events.iter().any(|e| matches!(
            e,
            ReconcileEvent::AlreadyPresent { city, .. } if city == "Austin"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ReconcileEvent::Added { city, population: 65_191, .. } if city == "Pflugerville"
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ReconcileEvent::BelowThreshold { city, population: Some(1_000), .. } if city == "Manor"
        )));
    }
}
