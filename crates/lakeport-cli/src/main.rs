// crates/lakeport-cli/src/main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use lakeport_core::config::LakeConfig;
use lakeport_core::pipeline::run_pipeline;
use lakeport_core::session::LakeSession;
use lakeport_core::stages::{airport, city, immigration, reconcile, reference, temperature};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Immigration data lake ETL", long_about = None)]
struct Cli {
    /// Path to the pipeline TOML configuration
    #[arg(short, long, default_value = "lakeport.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full stage sequence followed by the reconciliation check
    Run,
    /// Run a single stage
    Stage(StageArgs),
    /// Run only the reconciliation check against existing outputs
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct StageArgs {
    #[arg(value_enum)]
    stage: StageName,
}

#[derive(Args, Debug, Default)]
struct CheckArgs {
    /// Emit the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StageName {
    Visa,
    Transport,
    Country,
    Airport,
    City,
    Temperature,
    Immigration,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = LakeConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    config.export_credentials();
    let session = LakeSession::from_config(&config)?;

    match cli.command {
        Command::Run => {
            let outcome = run_pipeline(&session, &config)?;
            for summary in &outcome.stages {
                println!("{:<12} {:>10} rows", summary.stage, summary.rows_written);
            }
            print_report_table(&outcome.reconciliation);
            if !outcome.reconciliation.is_clean() {
                anyhow::bail!("reconciliation found mismatched counts or duplicate keys");
            }
            Ok(())
        }
        Command::Stage(args) => {
            let rows_written = match args.stage {
                StageName::Visa => reference::run_visa(&session, &config)?,
                StageName::Transport => reference::run_transport(&session, &config)?,
                StageName::Country => reference::run_country(&session, &config)?,
                StageName::Airport => airport::run(&session, &config)?,
                StageName::City => city::run(&session, &config)?,
                StageName::Temperature => temperature::run(&session, &config)?,
                StageName::Immigration => immigration::run(&session, &config)?,
            };
            info!(stage = ?args.stage, rows_written, "stage complete");
            Ok(())
        }
        Command::Check(args) => {
            let report = reconcile::run(&session, &config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report_table(&report);
            }
            if !report.is_clean() {
                anyhow::bail!("reconciliation found mismatched counts or duplicate keys");
            }
            Ok(())
        }
    }
}

fn print_report_table(report: &reconcile::ReconciliationReport) {
    let mut counts = Table::new();
    counts.set_header(["table_name", "source_count", "destination_count"]);
    for row in &report.counts {
        counts.add_row([
            row.table_name.clone(),
            row.source_count.to_string(),
            row.destination_count.to_string(),
        ]);
    }
    println!("{counts}");

    let mut duplicates = Table::new();
    duplicates.set_header(["table_name", "number_of_duplicates"]);
    for row in &report.duplicates {
        duplicates.add_row([row.table_name.clone(), row.number_of_duplicates.to_string()]);
    }
    println!("{duplicates}");
}
