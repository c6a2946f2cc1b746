use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::matching::{ProgressConfig, ReconcileOptions};
use crate::models::{ColumnMapping, Year};

pub const DEFAULT_LEGACY_PATH: &str = "public/data_files/1790-2010_MASTER.csv";
pub const DEFAULT_SNAPSHOT_PATH: &str = "public/data_files/us2021census.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "public/data_files/us_city_populations_1790-2020.csv";
pub const DEFAULT_CENSUS_URL: &str =
    "https://api.census.gov/data/2020/dec/pl?get=NAME,P1_001N&for=place:*&in=state:*";
pub const DEFAULT_CDP_OUTPUT_PATH: &str = "cdps_over_25k_2020.csv";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub legacy_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            legacy_path: DEFAULT_LEGACY_PATH.into(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.into(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub out_path: PathBuf,
    pub summary_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_path: DEFAULT_OUTPUT_PATH.into(),
            summary_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub snapshot_year: Year,
    /// Snapshot rows are appended only above this population.
    pub append_threshold: u64,
    pub progress_every: usize,
    /// Title-case city and county names while loading.
    pub title_case: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let opts = ReconcileOptions::default();
        Self {
            snapshot_year: opts.snapshot_year,
            append_threshold: opts.append_threshold,
            progress_every: opts.progress.update_every,
            title_case: true,
        }
    }
}

impl MatchingConfig {
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            snapshot_year: self.snapshot_year,
            append_threshold: self.append_threshold,
            progress: ProgressConfig {
                update_every: self.progress_every,
            },
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct CensusConfig {
    pub url: String,
    /// Read the place table from this JSON file instead of the network.
    pub from_file: Option<PathBuf>,
    pub min_population: u64,
    pub timeout_secs: u64,
    pub out_path: PathBuf,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CENSUS_URL.into(),
            from_file: None,
            min_population: 25_000,
            timeout_secs: 60,
            out_path: DEFAULT_CDP_OUTPUT_PATH.into(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub census: CensusConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.legacy_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "inputs.legacy_path",
            });
        }
        if self.inputs.snapshot_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "inputs.snapshot_path",
            });
        }
        if self.output.out_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "output.out_path",
            });
        }
        if self.output.out_path == self.inputs.legacy_path
            || self.output.out_path == self.inputs.snapshot_path
        {
            return Err(ConfigError::InvalidValue {
                field: "output.out_path",
                reason: "must differ from the input paths".into(),
            });
        }
        if !(1000..=9999).contains(&self.matching.snapshot_year) {
            return Err(ConfigError::InvalidValue {
                field: "matching.snapshot_year",
                reason: format!("{} is not a four-digit year", self.matching.snapshot_year),
            });
        }
        let names = [
            ("columns.legacy.city", &self.columns.legacy.city),
            ("columns.legacy.state", &self.columns.legacy.state),
            ("columns.snapshot.city", &self.columns.snapshot.city),
            ("columns.snapshot.state", &self.columns.snapshot.state),
        ];
        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(ConfigError::MissingField { field });
            }
        }
        if self.census.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "census.timeout_secs",
                reason: "must be > 0".into(),
            });
        }
        if self.census.url.trim().is_empty() && self.census.from_file.is_none() {
            return Err(ConfigError::MissingField { field: "census.url" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.matching.snapshot_year, 2020);
        assert_eq!(cfg.matching.append_threshold, 2_500);
        assert_eq!(cfg.matching.progress_every, 1_000);
        assert_eq!(cfg.census.min_population, 25_000);
        assert!(cfg.matching.title_case);
    }

    #[test]
    fn output_must_not_overwrite_input() {
        let mut cfg = AppConfig::default();
        cfg.output.out_path = cfg.inputs.legacy_path.clone();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue {
                field: "output.out_path",
                ..
            })
        ));
    }

    #[test]
    fn bad_year_rejected() {
        let mut cfg = AppConfig::default();
        cfg.matching.snapshot_year = 20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_column_name_rejected() {
        let mut cfg = AppConfig::default();
        cfg.columns.snapshot.state = " ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField {
                field: "columns.snapshot.state"
            })
        ));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"matching": {"snapshot_year": 2030, "append_threshold": 100, "progress_every": 10, "title_case": true}}"#)
                .unwrap();
        assert_eq!(cfg.matching.snapshot_year, 2030);
        assert_eq!(cfg.inputs, InputConfig::default());
        assert_eq!(cfg.matching.reconcile_options().progress.update_every, 10);
    }

    #[test]
    fn partial_section_fills_missing_fields() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{"matching": {"snapshot_year": 2030}, "output": {"summary_path": "s.csv"}, "columns": {"legacy": {"county": "CNTY"}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.matching.snapshot_year, 2030);
        assert_eq!(cfg.matching.append_threshold, 2_500);
        assert_eq!(cfg.matching.progress_every, 1_000);
        assert!(cfg.matching.title_case);
        assert_eq!(cfg.output.out_path, PathBuf::from(DEFAULT_OUTPUT_PATH));
        assert_eq!(cfg.output.summary_path, Some(PathBuf::from("s.csv")));
        assert_eq!(cfg.columns.legacy.county, "CNTY");
        assert_eq!(cfg.columns.legacy.city, "City");
        assert!(cfg.validate().is_ok());
    }
}
