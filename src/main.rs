use anyhow::Result;
use clap::Parser;
use log::error;

use place_merge::cli::{Cli, Command, parse_cli_to_app_config};
use place_merge::logging::init_logging;
use place_merge::matching::LogReporter;
use place_merge::orchestrator::{run_cdps, run_merge};
use place_merge::util::envfile::{load_dotenv_if_present, write_env_template};

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env must be in place before clap reads env-backed flags
    load_dotenv_if_present()?;
    let cli = Cli::parse();
    let command = cli.command_or_default()?;

    if let Command::EnvTemplate { path } = &command {
        write_env_template(path)?;
        println!(
            "Wrote {}. Copy to .env and edit values as needed.",
            path.display()
        );
        return Ok(());
    }

    let cfg = parse_cli_to_app_config(&cli)?;
    match &command {
        Command::Merge(_) => {
            let reporter = LogReporter;
            let summary = run_merge(&cfg, |e| reporter.report(e))?;
            summary.log();
        }
        Command::Cdps(_) => {
            run_cdps(&cfg.census).await?;
        }
        Command::EnvTemplate { .. } => {}
    }
    Ok(())
}
