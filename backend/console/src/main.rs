//! Ribon Ledger Console
//!
//! Standalone tool that:
//! 1. Deploys a manager from environment configuration
//! 2. Replays a JSON scenario of ledger operations against it
//! 3. Prints the committed event stream and a final balance report

mod accounts;
mod config;
mod errors;
mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::scenario::{Runner, Scenario};

#[derive(Parser, Debug)]
#[command(name = "ribon-console")]
#[command(about = "Ribon Ledger - replay donation scenarios", long_about = None)]
struct Cli {
    /// Path to the JSON scenario
    #[arg(long)]
    scenario: PathBuf,

    /// Stop at the first rejected step instead of recording it
    #[arg(long, default_value_t = false)]
    fail_fast: bool,

    /// Dry run mode - parse and validate the scenario without executing it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::from_env().context("loading configuration")?;
    config.validate()?;
    info!(
        "Ribon console starting - manager: {}, scenario: {}",
        config.manager_address,
        cli.scenario.display()
    );

    let scenario = Scenario::load(&cli.scenario)
        .await
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    info!(
        "Loaded scenario {} with {} steps",
        scenario.name.as_deref().unwrap_or("<unnamed>"),
        scenario.steps.len()
    );

    if cli.dry_run {
        warn!("DRY RUN MODE - Steps will not be executed");
        for (index, step) in scenario.steps.iter().enumerate() {
            info!("Would run step {}: {}", index, step.op());
        }
        return Ok(());
    }

    let mut runner = Runner::new(&config)?;
    let report = runner.run(&scenario, cli.fail_fast)?;
    for (name, address) in runner.accounts().iter() {
        debug!("{} = {}", name, address);
    }

    print!("{}", runner.ledger().events().to_json_lines()?);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failures.is_empty() {
        warn!("{} steps were rejected", report.failures.len());
    }
    Ok(())
}
