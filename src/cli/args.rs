//! Command-line argument parsing for rainsat_fetcher
//!
//! This module defines the CLI structure using clap derive macros: a
//! correlation search for one event, a bulk sweep over stored events,
//! product download with progress display, status polling, and credential
//! management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// rainsat_fetcher - pair rain events with satellite scenes and download them
#[derive(Parser, Debug)]
#[command(
    name = "rainsat_fetcher",
    version,
    about = "Correlate rain events with Sentinel-1 overpasses and download the paired scenes",
    long_about = "Finds the nearest satellite scene acquired before and after a rain event at a
grid cell, and downloads chosen products with progress tracking and cooperative cancellation."
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

    /// Directory that receives downloaded products
    #[arg(long, global = true, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the scene catalog for one rain event
    Search(SearchArgs),

    /// Search all events from an event file that have no completed search
    Sweep(SweepArgs),

    /// Download a product and watch progress until completion
    Download(DownloadArgs),

    /// Show the download status of a product
    Status(StatusArgs),

    /// Manage authentication credentials
    Auth(AuthArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the search command
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Grid cell identifier
    #[arg(short, long)]
    pub grid_id: String,

    /// Grid center latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Grid center longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Event window start, RFC 3339 (e.g. 2024-06-01T00:00:00Z)
    #[arg(long, value_name = "TIMESTAMP")]
    pub start: String,

    /// Event window end, RFC 3339
    #[arg(long, value_name = "TIMESTAMP")]
    pub end: String,

    /// Re-run the search and overwrite any cached result
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the sweep command
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// JSON file holding rain event records
    #[arg(value_name = "EVENTS_FILE")]
    pub events_file: PathBuf,

    /// Grid cell identifier to sweep
    #[arg(short, long)]
    pub grid_id: String,

    /// Grid center latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Grid center longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Event store page size
    #[arg(long, default_value = "500")]
    pub page_size: usize,
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Product identifier to download
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: String,

    /// Grid cell that requested the product (contextual only)
    #[arg(short, long, default_value = "")]
    pub grid_id: String,
}

/// Arguments for the status command
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Product identifier to inspect
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: String,

    /// Grid cell context (does not affect job identity)
    #[arg(short, long, default_value = "")]
    pub grid_id: String,
}

/// Arguments for authentication management
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Authentication actions
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Set up CDSE client credentials
    Setup,

    /// Verify current credentials
    Verify,

    /// Show authentication status
    Status,
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
    /// Write the default configuration file
    Init,

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
}

impl SearchArgs {
    /// Basic shape checks before the engine's own validation runs
    pub fn validate(&self) -> Result<(), String> {
        if self.grid_id.trim().is_empty() {
            return Err("grid id cannot be empty".to_string());
        }
        Ok(())
    }
}

impl DownloadArgs {
    /// Basic shape checks
    pub fn validate(&self) -> Result<(), String> {
        if self.product_id.trim().is_empty() {
            return Err("product id cannot be empty".to_string());
        }
        Ok(())
    }
}
