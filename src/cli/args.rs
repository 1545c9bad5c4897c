//! Command-line argument parsing for Seismic Fetcher
//!
//! This module defines the CLI structure using clap derive macros: running
//! or resuming an acquisition, archiving event windows, inspecting archive
//! progress, listing the station catalog and managing the configuration
//! file.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Seismic Fetcher - Build a day-by-day archive of continuous seismic waveforms
#[derive(Parser, Debug)]
#[command(
    name = "seismic_fetcher",
    version,
    about = "Resumable day-by-day downloader for continuous seismic waveforms",
    long_about = "Downloads continuous waveforms, station metadata and event catalogs from FDSN web services.
A day is only left behind once every qualifying station has been acquired, so an interrupted run
picks up exactly where it stopped."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Archive root directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire every incomplete day of the configured range
    Download(DownloadArgs),

    /// Archive a waveform window around every event of a year range
    Events(EventsArgs),

    /// Show acquisition progress of the archive
    Status(StatusArgs),

    /// List the stations recorded in the station catalog
    Catalog,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Day range shared by `download` and `status`
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day of the range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,
}

impl RangeArgs {
    /// Resolve the range against configured defaults
    pub fn resolve(&self, start: NaiveDate, end: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
        let start = self.start.unwrap_or(start);
        let end = self.end.unwrap_or(end);
        if start > end {
            return Err(format!("Start date {} is after end date {}", start, end));
        }
        Ok((start, end))
    }
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Number of concurrent channel requests per station
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Skip event catalog capture
    #[arg(long)]
    pub no_events: bool,

    /// Dry run - report the first incomplete day and its stations without downloading
    #[arg(long)]
    pub dry_run: bool,
}

impl DownloadArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Arguments for the events command
#[derive(Args, Debug, Clone)]
pub struct EventsArgs {
    /// First year to search for events
    #[arg(long, value_name = "YEAR")]
    pub start_year: i32,

    /// Last year to search for events, inclusive
    #[arg(long, value_name = "YEAR")]
    pub end_year: i32,

    /// Minimum event magnitude
    #[arg(long)]
    pub min_magnitude: Option<f64>,

    /// Number of concurrent channel requests per station
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Root directory of the event archive
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

impl EventsArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.start_year > self.end_year {
            return Err(format!(
                "Start year {} is after end year {}",
                self.start_year, self.end_year
            ));
        }
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Arguments for the status command
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Also report flagged days without any waveform file
    #[arg(long)]
    pub audit: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination file (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// True when the verbosity was chosen on the command line
    pub fn verbosity_overridden(&self) -> bool {
        self.global.quiet || self.global.verbose || self.global.very_verbose
    }
}
