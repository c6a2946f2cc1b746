//! Builds the final wide table: City, State, one column per year, Latitude, Longitude.

use std::collections::BTreeSet;

use crate::matching::matcher::MatchOutcome;
use crate::models::{LegacyRecord, LegacyTable, UnifiedRecord, Year};

pub const LEADING_COLUMNS: [&str; 2] = ["City", "State"];
pub const TRAILING_COLUMNS: [&str; 2] = ["Latitude", "Longitude"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedTable {
    /// Ascending, no duplicates.
    pub years: Vec<Year>,
    pub rows: Vec<UnifiedRecord>,
}

impl UnifiedTable {
    pub fn header(&self) -> Vec<String> {
        LEADING_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(self.years.iter().map(|y| y.to_string()))
            .chain(TRAILING_COLUMNS.iter().map(|s| s.to_string()))
            .collect()
    }

    /// Cells for one row in header order; unset values are empty.
    pub fn row_fields(&self, row: &UnifiedRecord) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.years.len() + 4);
        fields.push(row.city.clone());
        fields.push(row.state.clone());
        for y in &self.years {
            fields.push(
                row.populations
                    .get(y)
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            );
        }
        fields.push(row.latitude.map(|v| v.to_string()).unwrap_or_default());
        fields.push(row.longitude.map(|v| v.to_string()).unwrap_or_default());
        fields
    }

    pub fn year_range(&self) -> Option<(Year, Year)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

/// A legacy record with its matched snapshot population attached. Any legacy value
/// already stored under the snapshot year is replaced by the match result.
pub fn augment(record: &LegacyRecord, outcome: &MatchOutcome, snapshot_year: Year) -> UnifiedRecord {
    let mut populations = record.populations.clone();
    populations.remove(&snapshot_year);
    if let Some(pop) = outcome.population() {
        populations.insert(snapshot_year, pop);
    }
    UnifiedRecord {
        city: record.city.clone(),
        state: record.state.clone(),
        county: record.county.clone(),
        populations,
        latitude: record.latitude,
        longitude: record.longitude,
    }
}

/// Legacy rows (augmented, load order) followed by appended rows (scan order).
/// `outcomes` must be aligned with `legacy.records`.
pub fn assemble(
    legacy: &LegacyTable,
    outcomes: &[MatchOutcome],
    appended: Vec<UnifiedRecord>,
    snapshot_year: Year,
) -> UnifiedTable {
    debug_assert_eq!(legacy.records.len(), outcomes.len());
    let mut rows: Vec<UnifiedRecord> = legacy
        .records
        .iter()
        .zip(outcomes)
        .map(|(r, o)| augment(r, o, snapshot_year))
        .collect();
    rows.extend(appended);

    let mut years: BTreeSet<Year> = legacy.years.iter().copied().collect();
    years.insert(snapshot_year);
    for r in &rows {
        years.extend(r.populations.keys().copied());
    }
    UnifiedTable {
        years: years.into_iter().collect(),
        rows,
    }
}
