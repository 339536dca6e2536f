//! CLI command handlers
//!
//! Each handler wires the configuration into the relevant components and
//! renders results for the terminal. Download progress is observed purely by
//! polling the status registry, the same read path any other caller uses.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::{
    collect_all_events, CorrelationEngine, DownloadOrchestrator, DownloadStatus,
    HttpTransferClient, JsonEventStore, SatelliteInfo, SceneMetadata, SearchRequest,
    StacCatalogClient,
};
use crate::auth;
use crate::cli::args::{
    AuthAction, AuthArgs, ConfigAction, ConfigArgs, DownloadArgs, GlobalArgs, SearchArgs,
    StatusArgs, SweepArgs,
};
use crate::cli::progress::DownloadProgress;
use crate::config::AppConfig;
use crate::constants::downloads;
use crate::errors::{AppError, Result};

fn parse_timestamp(value: &str, which: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| AppError::generic(format!("Invalid {} timestamp '{}': {}", which, value, e)))
}

fn build_engine(config: &AppConfig) -> Result<CorrelationEngine> {
    let catalog = Arc::new(StacCatalogClient::new(config.catalog.clone())?);
    Ok(CorrelationEngine::new(config.correlation.clone(), catalog))
}

fn build_orchestrator(config: &AppConfig, global: &GlobalArgs) -> Result<DownloadOrchestrator> {
    let mut orchestrator_config = config.orchestrator.clone();
    if let Some(dir) = &global.download_dir {
        orchestrator_config.download_root = dir.clone();
    }
    let transfer = Arc::new(HttpTransferClient::new(config.transfer.clone())?);
    DownloadOrchestrator::new(orchestrator_config, transfer)
}

fn scene_line(scene: &SceneMetadata) -> String {
    let mission = crate::app::models::normalize_mission(scene.platform.as_deref())
        .unwrap_or_else(|| "-".to_string());
    let direction = crate::app::models::normalize_pass_direction(scene.orbit_direction.as_deref())
        .unwrap_or_else(|| "-".to_string());
    let orbit = scene
        .relative_orbit
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} @ {} ({} {} orbit {})",
        scene.id,
        scene.acquisition_time.format("%Y-%m-%dT%H:%M:%SZ"),
        mission,
        direction,
        orbit
    )
}

fn print_satellite_info(info: &SatelliteInfo) {
    println!("  searched: {}", info.searched);
    println!("  found:    {}", info.found);
    match &info.after {
        Some(scene) => {
            println!("  after:    {}", scene_line(scene));
            if let Some(delay) = info.delay_hours {
                println!("  delay:    {:.1} h", delay);
            }
        }
        None => println!("  after:    none within window"),
    }
    match &info.before {
        Some(scene) => println!("  before:   {}", scene_line(scene)),
        None => println!("  before:   none within window"),
    }
}

/// Run a correlation search for one rain event
pub async fn handle_search(args: SearchArgs, config: AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let event_start = parse_timestamp(&args.start, "start")?;
    let event_end = parse_timestamp(&args.end, "end")?;

    let engine = build_engine(&config)?;
    let request = SearchRequest {
        grid_id: args.grid_id.clone(),
        lat: args.lat,
        lon: args.lon,
        event_start,
        event_end,
        force: args.force,
    };

    let info = engine.search(&request).await?;

    println!(
        "Search result for {} [{} - {}]",
        args.grid_id,
        event_start.format("%Y-%m-%dT%H:%M:%SZ"),
        event_end.format("%Y-%m-%dT%H:%M:%SZ")
    );
    print_satellite_info(&info);
    Ok(())
}

/// Search every event in the file that has no completed result
pub async fn handle_sweep(args: SweepArgs, config: AppConfig) -> Result<()> {
    let store = JsonEventStore::new(&args.events_file);
    let events = collect_all_events(&store, &args.grid_id, args.page_size).await?;

    if events.is_empty() {
        println!("No events for grid {} in {}", args.grid_id, args.events_file.display());
        return Ok(());
    }
    println!(
        "Sweeping {} events for grid {}...",
        events.len(),
        args.grid_id
    );

    let engine = build_engine(&config)?;
    let stats = engine.search_missing(&events, args.lat, args.lon).await;

    println!("Sweep complete:");
    println!("  attempted: {}", stats.attempted);
    println!("  found:     {}", stats.found);
    println!("  not found: {}", stats.not_found);
    println!("  failed:    {}", stats.failed);
    println!("  skipped:   {}", stats.skipped);

    if stats.failed > 0 {
        println!("Failed events remain unsearched; run the sweep again to retry them.");
    }
    Ok(())
}

/// Download one product, watching status until a terminal state
pub async fn handle_download(
    args: DownloadArgs,
    config: AppConfig,
    global: &GlobalArgs,
) -> Result<()> {
    args.validate().map_err(AppError::generic)?;

    let orchestrator = build_orchestrator(&config, global)?;
    let status = orchestrator.start(&args.product_id, &args.grid_id);
    if status == DownloadStatus::Completed {
        println!("{} already downloaded", args.product_id);
        return Ok(());
    }

    let progress = DownloadProgress::new(&args.product_id, global.quiet);
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                debug!("Ctrl-C received, requesting cancellation");
                orchestrator.cancel(&args.product_id);
                cancel_requested = true;
            }
            _ = tokio::time::sleep(downloads::POLL_INTERVAL) => {}
        }

        let job = orchestrator.status(&args.product_id, &args.grid_id);
        match job.status {
            DownloadStatus::Downloading => progress.set_percent(job.progress),
            DownloadStatus::Completed => {
                progress.finish_completed();
                return Ok(());
            }
            DownloadStatus::NotStarted => {
                if let Some(error) = job.error {
                    progress.finish_failed(&error);
                    return Err(AppError::generic(format!(
                        "Download of {} failed: {}",
                        args.product_id, error
                    )));
                }
                progress.finish_cancelled();
                return Ok(());
            }
        }
    }
}

/// One-shot status poll for a product
pub async fn handle_status(args: StatusArgs, config: AppConfig, global: &GlobalArgs) -> Result<()> {
    let orchestrator = build_orchestrator(&config, global)?;
    let job = orchestrator.status(&args.product_id, &args.grid_id);

    println!("{}: {} ({:.1}%)", args.product_id, job.status, job.progress);
    if let Some(error) = job.error {
        println!("  last error: {}", error);
    }
    Ok(())
}

/// Credential management
pub async fn handle_auth(args: AuthArgs) -> Result<()> {
    match args.action {
        AuthAction::Setup => auth::setup_credentials().await?,
        AuthAction::Verify => {
            let valid = auth::verify_credentials().await?;
            if !valid {
                return Err(AppError::generic("Credential verification failed"));
            }
        }
        AuthAction::Status => auth::show_auth_status().await?,
    }
    Ok(())
}

/// Configuration management
pub async fn handle_config(args: ConfigArgs, config: AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init => {
            let path = AppConfig::init()?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| AppError::generic(format!("Failed to render config: {}", e)))?;
            print!("{}", rendered);
        }
    }
    Ok(())
}
