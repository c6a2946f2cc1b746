//! CLI module: clap-based argument parsing into an [`AppConfig`](crate::config::AppConfig).
//!
//! Resolution order, lowest to highest priority: built-in defaults, the optional
//! `--config` JSON file, `.env` / process environment, command-line flags.

mod clap_parser;

pub use clap_parser::{CdpsArgs, Cli, Command, MergeArgs, load_config_file, parse_cli_to_app_config};
