//! rainsat_fetcher CLI application
//!
//! Command-line interface for pairing rain events with Sentinel-1 scenes and
//! downloading chosen products with progress tracking and cancellation.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rainsat_fetcher::cli::{
    handle_auth, handle_config, handle_download, handle_search, handle_status, handle_sweep, Cli,
    Commands,
};
use rainsat_fetcher::config::AppConfig;
use rainsat_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok(); // Ignore errors if file doesn't exist

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(&cli);

    info!("rainsat_fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration before dispatching
    let config = AppConfig::load(cli.global.config.clone())?;

    // Execute the appropriate command
    match cli.command {
        Commands::Search(args) => {
            info!("Executing search command");
            handle_search(args, config).await
        }
        Commands::Sweep(args) => {
            info!("Executing sweep command");
            handle_sweep(args, config).await
        }
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, config, &cli.global).await
        }
        Commands::Status(args) => {
            info!("Executing status command");
            handle_status(args, config, &cli.global).await
        }
        Commands::Auth(args) => {
            info!("Executing auth command");
            handle_auth(args).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, config).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    // Create environment filter
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("rainsat_fetcher={}", log_level).parse().unwrap());

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
