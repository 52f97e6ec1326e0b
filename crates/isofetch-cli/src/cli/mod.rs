//! CLI for isofetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use isofetch_core::config;
use std::path::PathBuf;

use commands::{run_batch, run_completions, run_config, run_points, RunArgs};

/// Top-level CLI for isofetch.
#[derive(Debug, Parser)]
#[command(name = "isofetch")]
#[command(about = "isofetch: rate-limited isochrone retrieval for transit stations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch one isochrone per station and export the merged GeoJSON.
    Run {
        /// CSV file with longitude,latitude[,name,category,line] columns.
        points: PathBuf,

        /// Travel time in minutes (default: range_seconds from config).
        #[arg(long, short = 'm', value_name = "MIN")]
        minutes: Option<u32>,

        /// Travel time in seconds.
        #[arg(long, value_name = "SECS", conflicts_with = "minutes")]
        range_secs: Option<u32>,

        /// Output GeoJSON path (default: isochrones_<min>min_merged.geojson).
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Also write the run log as text (default name: isochrone_log_<timestamp>.txt).
        #[arg(long, value_name = "FILE")]
        log: Option<Option<PathBuf>>,

        /// Override the maximum attempts per station.
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },

    /// Load a station CSV and list what would be fetched.
    Points {
        /// CSV file to inspect.
        path: PathBuf,
    },

    /// Show the effective configuration and where it lives.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                points,
                minutes,
                range_secs,
                out,
                log,
                max_attempts,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = RunArgs {
                    points,
                    range_seconds: range_secs.or(minutes.map(|m| m.saturating_mul(60))),
                    out,
                    log,
                    max_attempts,
                };
                run_batch(&cfg, args).await?;
            }
            CliCommand::Points { path } => run_points(&path)?,
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
