//! Census-designated-place export from the decennial place table.
//!
//! The table arrives as a JSON array of arrays whose first row is the header
//! (`NAME, P1_001N, state, place`). Rows naming a CDP above a population floor are
//! kept, given a GEOID, and sorted by population, largest first.

pub mod fetch;

use serde_json::Value;

use crate::error::FetchError;
use crate::source::parse_population;

pub const NAME_COLUMN: &str = "NAME";
pub const POPULATION_COLUMN: &str = "P1_001N";
pub const STATE_COLUMN: &str = "state";
pub const PLACE_COLUMN: &str = "place";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceRow {
    pub name: String,
    pub state_fips: String,
    pub place_fips: String,
    /// Unparseable populations are kept as `None` and never pass the filter.
    pub population: Option<u64>,
}

impl PlaceRow {
    pub fn geoid(&self) -> String {
        format!("{}{}", self.state_fips, self.place_fips)
    }

    pub fn is_cdp(&self) -> bool {
        self.name.contains("CDP")
    }
}

fn as_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode the array-of-arrays payload.
pub fn parse_place_table(payload: &Value) -> Result<Vec<PlaceRow>, FetchError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| FetchError::Shape("expected a JSON array".into()))?;
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| FetchError::Shape("empty place table".into()))?;
    let header: Vec<String> = header
        .as_array()
        .ok_or_else(|| FetchError::Shape("header row is not an array".into()))?
        .iter()
        .map(as_text)
        .collect();
    let col = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FetchError::Shape(format!("missing column {name}")))
    };
    let (name_i, pop_i, state_i, place_i) = (
        col(NAME_COLUMN)?,
        col(POPULATION_COLUMN)?,
        col(STATE_COLUMN)?,
        col(PLACE_COLUMN)?,
    );

    body.iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .ok_or_else(|| FetchError::Shape(format!("row {} is not an array", i + 1)))?;
            let get = |idx: usize| cells.get(idx).map(as_text).unwrap_or_default();
            Ok(PlaceRow {
                name: get(name_i),
                state_fips: get(state_i),
                place_fips: get(place_i),
                population: parse_population(&get(pop_i)).ok().flatten(),
            })
        })
        .collect()
}

/// CDPs strictly above `min_population`, largest first; ties keep input order.
pub fn select_cdps(rows: Vec<PlaceRow>, min_population: u64) -> Vec<PlaceRow> {
    let mut out: Vec<PlaceRow> = rows
        .into_iter()
        .filter(|r| r.is_cdp() && r.population.is_some_and(|p| p > min_population))
        .collect();
    out.sort_by(|a, b| b.population.cmp(&a.population));
    out
}
