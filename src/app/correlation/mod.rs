//! Rain event / satellite scene correlation
//!
//! The correlation engine turns a rain event into a before/after scene
//! pairing: the nearest scene acquired after the event end (which gates
//! `found` and defines the delay) and the nearest scene before the event
//! start (informational). Completed results are cached per event identity;
//! transient catalog failures leave the cache untouched so that retry sweeps
//! revisit the event.

pub mod config;
pub mod sweep;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::app::catalog::{sort_scenes, SceneCatalogClient, SearchOrder, TimeRange};
use crate::app::models::{EventKey, RainEvent, SatelliteInfo, SceneMetadata};
use crate::errors::{CorrelationError, CorrelationResult};

pub use config::CorrelationConfig;
pub use sweep::SweepStats;

/// One correlation search request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Grid cell identifier
    pub grid_id: String,
    /// Grid center latitude
    pub lat: f64,
    /// Grid center longitude
    pub lon: f64,
    /// Event window start (UTC)
    pub event_start: DateTime<Utc>,
    /// Event window end (UTC)
    pub event_end: DateTime<Utc>,
    /// Bypass and overwrite the cached result
    pub force: bool,
}

impl SearchRequest {
    /// Build a request from a stored rain event
    pub fn from_event(event: &RainEvent, lat: f64, lon: f64, force: bool) -> Self {
        Self {
            grid_id: event.grid_id.clone(),
            lat,
            lon,
            event_start: event.start_ts,
            event_end: event.end_ts,
            force,
        }
    }

    /// Cache identity for this request
    pub fn key(&self) -> EventKey {
        EventKey {
            grid_id: self.grid_id.clone(),
            start_ts: self.event_start,
            end_ts: self.event_end,
        }
    }

    /// Reject malformed coordinates and time ranges before any query
    pub fn validate(&self) -> CorrelationResult<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(CorrelationError::Validation {
                reason: format!("latitude out of range: {}", self.lat),
            });
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(CorrelationError::Validation {
                reason: format!("longitude out of range: {}", self.lon),
            });
        }
        if self.event_start > self.event_end {
            return Err(CorrelationError::Validation {
                reason: format!(
                    "event start {} is after event end {}",
                    self.event_start, self.event_end
                ),
            });
        }
        Ok(())
    }
}

/// Correlates rain events with satellite overpasses
pub struct CorrelationEngine {
    config: CorrelationConfig,
    catalog: Arc<dyn SceneCatalogClient>,
    cache: RwLock<HashMap<EventKey, SatelliteInfo>>,
}

impl std::fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl CorrelationEngine {
    /// Create an engine over a catalog client
    pub fn new(config: CorrelationConfig, catalog: Arc<dyn SceneCatalogClient>) -> Self {
        Self {
            config,
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Cached result for an event identity, if a search has completed
    pub fn cached(&self, key: &EventKey) -> Option<SatelliteInfo> {
        let cache = self
            .cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(key).cloned()
    }

    /// Run the correlation search for one event
    ///
    /// Returns the cached result unchanged when one exists and `force` is
    /// off. A completed search (whether or not a scene was found) is cached
    /// and returned with `searched = true`; catalog timeouts and transport
    /// failures surface as transient errors without touching the cache.
    pub async fn search(&self, request: &SearchRequest) -> CorrelationResult<SatelliteInfo> {
        request.validate()?;
        let key = request.key();

        if !request.force {
            if let Some(cached) = self.cached(&key) {
                debug!("Correlation cache hit for {}", request.grid_id);
                return Ok(cached);
            }
        }

        let window = self.config.window();

        let forward = TimeRange::new(request.event_end, request.event_end + window);
        let mut after_candidates = self
            .query_with_deadline(request.lat, request.lon, forward, SearchOrder::Ascending)
            .await?;
        sort_scenes(&mut after_candidates, SearchOrder::Ascending);
        let after = after_candidates
            .into_iter()
            .find(|s| s.acquisition_time >= request.event_end);

        let backward = TimeRange::new(request.event_start - window, request.event_start);
        let mut before_candidates = self
            .query_with_deadline(request.lat, request.lon, backward, SearchOrder::Descending)
            .await?;
        sort_scenes(&mut before_candidates, SearchOrder::Descending);
        let before = before_candidates
            .into_iter()
            .find(|s| s.acquisition_time <= request.event_start);

        let info = SatelliteInfo::searched(after, before, request.event_end);
        if info.found {
            info!(
                "Paired event at {} with scene {} (delay {:.1}h)",
                request.grid_id,
                info.after.as_ref().map(|s| s.id.as_str()).unwrap_or(""),
                info.delay_hours.unwrap_or(0.0)
            );
        } else {
            info!("No after-scene within window for {}", request.grid_id);
        }

        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.insert(key, info.clone());

        Ok(info)
    }

    /// Issue one catalog query under the configured deadline
    async fn query_with_deadline(
        &self,
        lat: f64,
        lon: f64,
        range: TimeRange,
        order: SearchOrder,
    ) -> CorrelationResult<Vec<SceneMetadata>> {
        match timeout(
            self.config.query_timeout(),
            self.catalog.query(lat, lon, range, order),
        )
        .await
        {
            Ok(result) => result.map_err(CorrelationError::from),
            Err(_) => Err(CorrelationError::CatalogTimeout {
                seconds: self.config.query_timeout_secs,
            }),
        }
    }
}
