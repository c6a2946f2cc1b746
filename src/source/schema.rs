use csv::StringRecord;

use crate::error::SourceError;
use crate::models::{LegacyColumnNames, SnapshotColumnNames, Year};

/// Resolved header positions of the legacy table.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLayout {
    pub city: usize,
    pub state: usize,
    pub county: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    /// (column index, year) for every numeric header, in header order.
    pub years: Vec<(usize, Year)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLayout {
    pub city: usize,
    pub state: usize,
    pub counties: Option<usize>,
    pub population: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
}

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// A header made only of ASCII digits names a census year column.
pub fn year_of(header: &str) -> Option<Year> {
    let h = header.trim();
    if h.is_empty() || !h.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    h.parse().ok()
}

fn require(
    table: &'static str,
    found: [(Option<usize>, &str); 2],
) -> Result<(usize, usize), SourceError> {
    let missing: Vec<String> = found
        .iter()
        .filter(|(idx, _)| idx.is_none())
        .map(|(_, name)| name.to_string())
        .collect();
    match found {
        [(Some(a), _), (Some(b), _)] => Ok((a, b)),
        _ => Err(SourceError::MissingColumns {
            table,
            columns: missing,
        }),
    }
}

pub fn discover_legacy_columns(
    headers: &StringRecord,
    names: &LegacyColumnNames,
) -> Result<LegacyLayout, SourceError> {
    let (city, state) = require(
        "legacy",
        [
            (position(headers, &names.city), names.city.as_str()),
            (position(headers, &names.state), names.state.as_str()),
        ],
    )?;
    let years = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| year_of(h).map(|y| (i, y)))
        .collect();
    Ok(LegacyLayout {
        city,
        state,
        county: position(headers, &names.county),
        latitude: position(headers, &names.latitude),
        longitude: position(headers, &names.longitude),
        years,
    })
}

pub fn discover_snapshot_columns(
    headers: &StringRecord,
    names: &SnapshotColumnNames,
) -> Result<SnapshotLayout, SourceError> {
    let (city, state) = require(
        "snapshot",
        [
            (position(headers, &names.city), names.city.as_str()),
            (position(headers, &names.state), names.state.as_str()),
        ],
    )?;
    Ok(SnapshotLayout {
        city,
        state,
        counties: position(headers, &names.counties),
        population: position(headers, &names.population),
        latitude: position(headers, &names.latitude),
        longitude: position(headers, &names.longitude),
    })
}
