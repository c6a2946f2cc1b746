//! Loading of the legacy and snapshot tables from delimited text.

pub mod schema;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::error::SourceError;
use crate::models::{LegacyColumnNames, LegacyRecord, LegacyTable, NewRecord, SnapshotColumnNames};
use crate::normalize::{normalize_state, tidy_name};
use schema::{discover_legacy_columns, discover_snapshot_columns};

/// Parse a population cell. Accepts `1,234` and integral floats such as `1234.0`.
/// Empty cells are unset.
pub fn parse_population(raw: &str) -> Result<Option<u64>, String> {
    let s: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if s.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = s.parse::<u64>() {
        return Ok(Some(v));
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
        _ => Err(format!("invalid population value {:?}", raw.trim())),
    }
}

pub fn parse_coordinate(raw: &str) -> Result<Option<f64>, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid coordinate {:?}", s))
}

fn cell(rec: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| rec.get(i)).unwrap_or("")
}

fn malformed(table: &'static str, row: usize) -> impl Fn(String) -> SourceError {
    move |reason| SourceError::MalformedRow { table, row, reason }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new().flexible(true).from_reader(input)
}

fn open(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|source| SourceError::Unavailable {
        path: path.display().to_string(),
        source,
    })
}

/// Read the legacy table. Row numbers in errors are 1-based data rows.
pub fn read_legacy<R: Read>(
    input: R,
    names: &LegacyColumnNames,
    title: bool,
) -> Result<LegacyTable, SourceError> {
    let mut rdr = reader(input);
    let layout = discover_legacy_columns(rdr.headers()?, names)?;
    let mut records = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let bad = malformed("legacy", i + 1);
        let county = tidy_name(cell(&rec, layout.county), title);
        let mut record = LegacyRecord::new(
            &tidy_name(cell(&rec, Some(layout.city)), title),
            &normalize_state(cell(&rec, Some(layout.state))),
            (!county.is_empty()).then_some(county.as_str()),
        )
        .with_coordinates(
            parse_coordinate(cell(&rec, layout.latitude)).map_err(&bad)?,
            parse_coordinate(cell(&rec, layout.longitude)).map_err(&bad)?,
        );
        for &(col, year) in &layout.years {
            if let Some(pop) = parse_population(cell(&rec, Some(col))).map_err(&bad)? {
                record.populations.insert(year, pop);
            }
        }
        records.push(record);
    }
    Ok(LegacyTable {
        years: layout.years.iter().map(|&(_, y)| y).collect(),
        records,
    })
}

pub fn read_snapshot<R: Read>(
    input: R,
    names: &SnapshotColumnNames,
    title: bool,
) -> Result<Vec<NewRecord>, SourceError> {
    let mut rdr = reader(input);
    let layout = discover_snapshot_columns(rdr.headers()?, names)?;
    let mut records = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let bad = malformed("snapshot", i + 1);
        let record = NewRecord::new(
            &tidy_name(cell(&rec, Some(layout.city)), title),
            &normalize_state(cell(&rec, Some(layout.state))),
            &tidy_name(cell(&rec, layout.counties), title),
            parse_population(cell(&rec, layout.population)).map_err(&bad)?,
        )
        .with_coordinates(
            parse_coordinate(cell(&rec, layout.latitude)).map_err(&bad)?,
            parse_coordinate(cell(&rec, layout.longitude)).map_err(&bad)?,
        );
        records.push(record);
    }
    Ok(records)
}

pub fn load_legacy_csv(
    path: &Path,
    names: &LegacyColumnNames,
    title: bool,
) -> Result<LegacyTable, SourceError> {
    read_legacy(open(path)?, names, title)
}

pub fn load_snapshot_csv(
    path: &Path,
    names: &SnapshotColumnNames,
    title: bool,
) -> Result<Vec<NewRecord>, SourceError> {
    read_snapshot(open(path)?, names, title)
}
