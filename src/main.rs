use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use elec_report::config::Settings;
use elec_report::record::load_records;
use elec_report::render::{build_calendar_table, render_report};
use elec_report::Engine;
use env_logger;
use log::info;
use std::path::{Path, PathBuf};

/// Net-metering report: on-peak / off-peak, weekend and holiday volumes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings TOML file (holidays and peak hours), built-in US defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a generation CSV file and print the report
    Report {
        /// Generation Data CSV file
        csv: PathBuf,
    },

    /// List the holidays of a year, observed days included
    Holidays {
        year: i32,
    },
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => Settings::load(p),
        None => {
            info!("load_settings: no settings file given, using built-in defaults");
            Ok(Settings::us_default())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;
    let engine = Engine::from_settings(&settings);

    match args.command {
        Command::Report { csv } => {
            let records = load_records(&csv)?;
            let report = engine
                .aggregator
                .aggregate(&records)
                .with_context(|| format!("unable to build report for {}", csv.display()))?;
            print!("{}", render_report(&report));
        }
        Command::Holidays { year } => {
            let holidays = engine.calendar.holidays_with_names(year)?;
            info!("{} holidays in {}", holidays.len(), year);
            println!("{}", build_calendar_table(&holidays));
        }
    }
    Ok(())
}
