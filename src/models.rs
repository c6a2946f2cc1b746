use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize::normalize_city;

/// Census year label, e.g. `1790` or `2020`.
pub type Year = u16;

/// Anything that can be bucketed by (normalized city, state).
pub trait PlaceKey {
    fn norm_city(&self) -> &str;
    fn state(&self) -> &str;
}

/// One row of the historical (1790-2010) table.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyRecord {
    pub city: String,
    pub state: String,
    pub county: Option<String>,
    pub populations: BTreeMap<Year, u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    norm_city: String,
}

impl LegacyRecord {
    pub fn new(city: &str, state: &str, county: Option<&str>) -> Self {
        Self {
            city: city.to_string(),
            state: state.to_string(),
            county: county.map(|c| c.to_string()),
            populations: BTreeMap::new(),
            latitude: None,
            longitude: None,
            norm_city: normalize_city(city),
        }
    }

    pub fn with_population(mut self, year: Year, population: u64) -> Self {
        self.populations.insert(year, population);
        self
    }

    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    /// County name usable for disambiguation; `None` when absent or blank.
    pub fn county_hint(&self) -> Option<&str> {
        self.county.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

impl PlaceKey for LegacyRecord {
    fn norm_city(&self) -> &str {
        &self.norm_city
    }
    fn state(&self) -> &str {
        &self.state
    }
}

/// One row of the current census snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub city: String,
    pub state: String,
    /// Free text; may name several counties.
    pub counties: String,
    pub population: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    norm_city: String,
}

impl NewRecord {
    pub fn new(city: &str, state: &str, counties: &str, population: Option<u64>) -> Self {
        Self {
            city: city.to_string(),
            state: state.to_string(),
            counties: counties.to_string(),
            population,
            latitude: None,
            longitude: None,
            norm_city: normalize_city(city),
        }
    }

    pub fn with_coordinates(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}

impl PlaceKey for NewRecord {
    fn norm_city(&self) -> &str {
        &self.norm_city
    }
    fn state(&self) -> &str {
        &self.state
    }
}

/// Output row: one place across every available census year.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedRecord {
    pub city: String,
    pub state: String,
    pub county: Option<String>,
    pub populations: BTreeMap<Year, u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Grouping identity: (normalized city, state).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictKey {
    pub norm_city: String,
    pub state: String,
}

impl ConflictKey {
    pub fn of<T: PlaceKey + ?Sized>(record: &T) -> Self {
        Self {
            norm_city: record.norm_city().to_string(),
            state: record.state().to_string(),
        }
    }
}

/// The legacy table loaded from disk: its numeric-year header columns plus rows in file order.
#[derive(Debug, Clone, Default)]
pub struct LegacyTable {
    pub years: Vec<Year>,
    pub records: Vec<LegacyRecord>,
}

// Column mapping for flexible schemas; map expected fields to source header names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyColumnNames {
    pub city: String,
    pub state: String,
    pub county: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for LegacyColumnNames {
    fn default() -> Self {
        Self {
            city: "City".into(),
            state: "ST".into(),
            county: "County".into(),
            latitude: "LAT_BING".into(),
            longitude: "LON_BING".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotColumnNames {
    pub city: String,
    pub state: String,
    pub counties: String,
    pub population: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for SnapshotColumnNames {
    fn default() -> Self {
        Self {
            city: "City".into(),
            state: "State".into(),
            counties: "Counties".into(),
            population: "Population".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ColumnMapping {
    #[serde(default)]
    pub legacy: LegacyColumnNames,
    #[serde(default)]
    pub snapshot: SnapshotColumnNames,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_city_is_derived_on_construction() {
        let l = LegacyRecord::new("St. Louis", "MO", Some("St Louis"));
        let n = NewRecord::new("Saint Louis", "MO", "St Louis", Some(300_000));
        assert_eq!(l.norm_city(), "st louis");
        assert_eq!(ConflictKey::of(&l), ConflictKey::of(&n));
    }

    #[test]
    fn county_hint_skips_blank() {
        assert_eq!(LegacyRecord::new("A", "TX", Some("  ")).county_hint(), None);
        assert_eq!(LegacyRecord::new("A", "TX", None).county_hint(), None);
        assert_eq!(
            LegacyRecord::new("A", "TX", Some(" Travis ")).county_hint(),
            Some("Travis")
        );
    }
}
