//! Command-line interface components
//!
//! This module contains CLI-specific code for rainsat_fetcher, including
//! argument parsing, command handlers, and download progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    AuthAction, AuthArgs, Cli, Commands, ConfigAction, ConfigArgs, DownloadArgs, GlobalArgs,
    SearchArgs, StatusArgs, SweepArgs,
};
pub use commands::{
    handle_auth, handle_config, handle_download, handle_search, handle_status, handle_sweep,
};
pub use progress::DownloadProgress;
