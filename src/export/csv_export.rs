use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};

use crate::assemble::UnifiedTable;
use crate::census::PlaceRow;
use crate::error::ExportError;
use crate::orchestrator::summary::RunSummary;

pub const CDP_HEADERS: [&str; 5] = ["name", "state_fips", "place_fips", "geoid", "population_2020"];

/// Header row then one row per place; no index column.
pub fn write_unified<W: Write>(out: W, table: &UnifiedTable) -> Result<(), ExportError> {
    let mut w = WriterBuilder::new().from_writer(out);
    w.write_record(table.header())?;
    for row in &table.rows {
        w.write_record(table.row_fields(row))?;
    }
    w.flush().map_err(|source| ExportError::Io {
        path: "<writer>".into(),
        source,
    })?;
    Ok(())
}

pub fn write_cdps<W: Write>(out: W, rows: &[PlaceRow]) -> Result<(), ExportError> {
    let mut w = WriterBuilder::new().from_writer(out);
    w.write_record(CDP_HEADERS)?;
    for r in rows {
        let pop = r.population.map(|p| p.to_string()).unwrap_or_default();
        w.write_record([
            r.name.as_str(),
            r.state_fips.as_str(),
            r.place_fips.as_str(),
            r.geoid().as_str(),
            pop.as_str(),
        ])?;
    }
    w.flush().map_err(|source| ExportError::Io {
        path: "<writer>".into(),
        source,
    })?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write through a sibling temp file and rename into place, so a failed run never
/// leaves a truncated file at `path`. Missing parent directories are created.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<(), ExportError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let tmp = temp_sibling(path);
    let file =
        File::create(&tmp).with_context(|| format!("Failed to create {}", tmp.display()))?;
    if let Err(e) = write(BufWriter::with_capacity(512 * 1024, file)) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("Failed to move {} into place", path.display()));
    }
    Ok(())
}

pub fn export_unified_csv(path: &Path, table: &UnifiedTable) -> Result<()> {
    write_atomically(path, |w| write_unified(w, table))
}

pub fn export_cdps_csv(path: &Path, rows: &[PlaceRow]) -> Result<()> {
    write_atomically(path, |w| write_cdps(w, rows))
}

fn write_summary<W: Write>(w: &mut Writer<W>, s: &RunSummary) -> Result<(), ExportError> {
    w.write_record(["Key", "Value"])?;

    let mut write_kv = |k: &str, v: String| -> Result<(), ExportError> {
        w.write_record([k, v.as_str()])?;
        Ok(())
    };

    write_kv("Legacy input", s.legacy_path.clone())?;
    write_kv("Snapshot input", s.snapshot_path.clone())?;
    write_kv("Output", s.out_path.clone())?;
    write_kv("Snapshot year", s.snapshot_year.to_string())?;

    write_kv("Total records (legacy)", s.total_legacy.to_string())?;
    write_kv("Total records (snapshot)", s.total_snapshot.to_string())?;
    write_kv("Conflicted keys (legacy)", s.conflicted_legacy.to_string())?;
    write_kv("Conflicted keys (snapshot)", s.conflicted_snapshot.to_string())?;

    let t = &s.tally;
    write_kv("Matched by city/state", t.matched_by_name.to_string())?;
    write_kv("Matched by county", t.matched_by_county.to_string())?;
    write_kv("No match", t.no_match.to_string())?;
    write_kv("No county match", t.no_county_match.to_string())?;
    write_kv("Ambiguous", t.ambiguous.to_string())?;
    write_kv("New cities added", t.added.to_string())?;
    write_kv("Snapshot rows already present", t.already_present.to_string())?;
    write_kv("Snapshot rows below threshold", t.below_threshold.to_string())?;

    write_kv("Output rows", s.output_rows.to_string())?;
    if let Some((first, last)) = s.year_range {
        write_kv("Year range", format!("{first}-{last}"))?;
    }
    write_kv("Started (UTC)", s.started_utc.to_rfc3339())?;
    write_kv("Ended (UTC)", s.ended_utc.to_rfc3339())?;
    write_kv("Duration (s)", format!("{:.3}", s.duration_secs))?;
    Ok(())
}

pub fn export_summary_csv(path: &Path, summary: &RunSummary) -> Result<()> {
    write_atomically(path, |out| {
        let mut w = WriterBuilder::new().from_writer(out);
        write_summary(&mut w, summary)?;
        w.flush().map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnifiedRecord;
    use std::collections::BTreeMap;

    #[test]
    fn unified_csv_layout() {
        let table = UnifiedTable {
            years: vec![1950, 2020],
            rows: vec![
                UnifiedRecord {
                    city: "St. Louis".into(),
                    state: "MO".into(),
                    county: Some("St Louis".into()),
                    populations: BTreeMap::from([(1950, 856_796), (2020, 301_578)]),
                    latitude: Some(38.627),
                    longitude: Some(-90.199),
                },
                UnifiedRecord {
                    city: "Frisco".into(),
                    state: "TX".into(),
                    county: Some("Collin, Denton".into()),
                    populations: BTreeMap::from([(2020, 200_509)]),
                    latitude: None,
                    longitude: None,
                },
            ],
        };
        let mut buf = Vec::new();
        write_unified(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "City,State,1950,2020,Latitude,Longitude\n\
             St. Louis,MO,856796,301578,38.627,-90.199\n\
             Frisco,TX,,200509,,\n"
        );
    }

    #[test]
    fn cdp_csv_layout() {
        let rows = vec![PlaceRow {
            name: "The Woodlands CDP, Texas".into(),
            state_fips: "48".into(),
            place_fips: "72656".into(),
            population: Some(114_436),
        }];
        let mut buf = Vec::new();
        write_cdps(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "name,state_fips,place_fips,geoid,population_2020\n\
             \"The Woodlands CDP, Texas\",48,72656,4872656,114436\n"
        );
    }

    #[test]
    fn temp_path_is_sibling() {
        assert_eq!(
            temp_sibling(Path::new("out/data.csv")),
            PathBuf::from("out/data.csv.partial")
        );
    }

    #[test]
    fn failed_rename_removes_partial_file() {
        let dir = std::env::temp_dir().join(format!("place_merge_rename_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        // a non-empty directory at the destination makes the rename fail
        let out = dir.join("merged.csv");
        fs::create_dir_all(out.join("occupied")).unwrap();

        let err = export_cdps_csv(&out, &[]).unwrap_err();
        assert!(format!("{err:#}").contains("into place"));
        assert!(!temp_sibling(&out).exists());
        assert!(out.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }
}
