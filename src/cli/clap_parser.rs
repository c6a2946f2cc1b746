use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::models::Year;

#[derive(Parser, Debug)]
#[command(
    name = "place_merge",
    version,
    about = "Merge historical and current census place populations into one table",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// JSON configuration file; command-line flags override its values (env: PLACE_MERGE_CONFIG)
    #[arg(long, global = true, value_name = "FILE", env = "PLACE_MERGE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Defaults to `merge` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run. A bare invocation is a `merge` whose flags come from the environment.
    pub fn command_or_default(&self) -> Result<Command> {
        match &self.command {
            Some(cmd) => Ok(cmd.clone()),
            None => {
                let bare = BareMerge::try_parse_from(["place_merge"])
                    .context("Invalid merge settings in the environment")?;
                Ok(Command::Merge(bare.args))
            }
        }
    }
}

/// `merge` arguments resolved without a subcommand on the command line.
#[derive(Parser, Debug)]
struct BareMerge {
    #[command(flatten)]
    args: MergeArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reconcile the legacy table with the census snapshot and write the unified table
    Merge(MergeArgs),
    /// Export census-designated places above a population floor
    Cdps(CdpsArgs),
    /// Write a commented .env template
    EnvTemplate {
        #[arg(value_name = "PATH", default_value = ".env.template")]
        path: PathBuf,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct MergeArgs {
    /// Legacy 1790-2010 table (env: PLACE_MERGE_LEGACY)
    #[arg(long, value_name = "CSV", env = "PLACE_MERGE_LEGACY")]
    pub legacy: Option<PathBuf>,
    /// Census snapshot table (env: PLACE_MERGE_SNAPSHOT)
    #[arg(long, value_name = "CSV", env = "PLACE_MERGE_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,
    /// Unified output table (env: PLACE_MERGE_OUT)
    #[arg(long, value_name = "CSV", env = "PLACE_MERGE_OUT")]
    pub out: Option<PathBuf>,
    /// Optional Key,Value run summary (env: PLACE_MERGE_SUMMARY)
    #[arg(long, value_name = "CSV", env = "PLACE_MERGE_SUMMARY")]
    pub summary: Option<PathBuf>,
    /// Year column for snapshot populations (env: PLACE_MERGE_SNAPSHOT_YEAR)
    #[arg(long, value_name = "YEAR", env = "PLACE_MERGE_SNAPSHOT_YEAR")]
    pub snapshot_year: Option<Year>,
    /// Unmatched snapshot rows above this population are appended (env: PLACE_MERGE_APPEND_THRESHOLD)
    #[arg(long, value_name = "N", env = "PLACE_MERGE_APPEND_THRESHOLD")]
    pub append_threshold: Option<u64>,
    /// Report progress every N rows, 0 to disable (env: PLACE_MERGE_PROGRESS_EVERY)
    #[arg(long, value_name = "N", env = "PLACE_MERGE_PROGRESS_EVERY")]
    pub progress_every: Option<usize>,
    /// Title-case city and county names while loading, on by default (env: PLACE_MERGE_TITLE_CASE)
    #[arg(long, value_name = "BOOL", env = "PLACE_MERGE_TITLE_CASE")]
    pub title_case: Option<bool>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct CdpsArgs {
    /// Census API URL (env: PLACE_MERGE_CENSUS_URL)
    #[arg(long, value_name = "URL", env = "PLACE_MERGE_CENSUS_URL")]
    pub url: Option<String>,
    /// Read the place table JSON from a file instead of the network
    #[arg(long, value_name = "JSON")]
    pub from_file: Option<PathBuf>,
    /// Keep CDPs strictly above this population (env: PLACE_MERGE_CDP_MIN_POP)
    #[arg(long, value_name = "N", env = "PLACE_MERGE_CDP_MIN_POP")]
    pub min_population: Option<u64>,
    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Output CSV (env: PLACE_MERGE_CDP_OUT)
    #[arg(long, value_name = "CSV", env = "PLACE_MERGE_CDP_OUT")]
    pub out: Option<PathBuf>,
}

impl MergeArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(p) = &self.legacy {
            cfg.inputs.legacy_path = p.clone();
        }
        if let Some(p) = &self.snapshot {
            cfg.inputs.snapshot_path = p.clone();
        }
        if let Some(p) = &self.out {
            cfg.output.out_path = p.clone();
        }
        if let Some(p) = &self.summary {
            cfg.output.summary_path = Some(p.clone());
        }
        if let Some(y) = self.snapshot_year {
            cfg.matching.snapshot_year = y;
        }
        if let Some(t) = self.append_threshold {
            cfg.matching.append_threshold = t;
        }
        if let Some(n) = self.progress_every {
            cfg.matching.progress_every = n;
        }
        if let Some(t) = self.title_case {
            cfg.matching.title_case = t;
        }
    }
}

impl CdpsArgs {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(u) = &self.url {
            cfg.census.url = u.clone();
        }
        if let Some(p) = &self.from_file {
            cfg.census.from_file = Some(p.clone());
        }
        if let Some(n) = self.min_population {
            cfg.census.min_population = n;
        }
        if let Some(t) = self.timeout {
            cfg.census.timeout_secs = t;
        }
        if let Some(p) = &self.out {
            cfg.census.out_path = p.clone();
        }
    }
}

/// Base configuration from a JSON file, or defaults when none is given.
pub fn load_config_file(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Resolve the effective configuration: config file, then subcommand flags, then validation.
pub fn parse_cli_to_app_config(cli: &Cli) -> Result<AppConfig> {
    let mut cfg = load_config_file(cli.config.as_deref())?;
    match &cli.command_or_default()? {
        Command::Merge(args) => args.apply(&mut cfg),
        Command::Cdps(args) => args.apply(&mut cfg),
        Command::EnvTemplate { .. } => {}
    }
    cfg.validate()?;
    Ok(cfg)
}
