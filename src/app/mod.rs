//! Core application logic for rainsat_fetcher
//!
//! This module contains the main application components: the scene catalog
//! client, the correlation engine, the download job registry, the transfer
//! client, and the download orchestrator.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use rainsat_fetcher::app::{
//!     CatalogConfig, CorrelationConfig, CorrelationEngine, SearchRequest, StacCatalogClient,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(StacCatalogClient::new(CatalogConfig::default())?);
//! let engine = CorrelationEngine::new(CorrelationConfig::default(), catalog);
//!
//! let request = SearchRequest {
//!     grid_id: "G135N35".to_string(),
//!     lat: 35.0,
//!     lon: 135.0,
//!     event_start: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
//!     event_end: Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap(),
//!     force: false,
//! };
//! let info = engine.search(&request).await?;
//! if info.found {
//!     println!("Paired with delay {:?}h", info.delay_hours);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod correlation;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod transfer;

// Re-export main public API
pub use catalog::{CatalogConfig, SceneCatalogClient, SearchOrder, StacCatalogClient, TimeRange};
pub use correlation::{CorrelationConfig, CorrelationEngine, SearchRequest, SweepStats};
pub use events::{collect_all_events, EventStore, JsonEventStore};
pub use models::{
    DownloadJob, DownloadStatus, EventKey, RainEvent, SatelliteInfo, SceneMetadata,
};
pub use orchestrator::{DownloadOrchestrator, OrchestratorConfig};
pub use registry::StatusRegistry;
pub use transfer::{HttpTransferClient, TransferClient, TransferConfig};
