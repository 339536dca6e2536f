//! Batch correlation sweeps
//!
//! A sweep runs the correlation search for every event that has no completed
//! result yet, with bounded concurrency on top of the catalog client's rate
//! limiting. Transient failures are counted and skipped so a later sweep can
//! retry them; a sweep itself never fails.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::app::correlation::{CorrelationEngine, SearchRequest};
use crate::app::models::RainEvent;

/// Outcome counters for one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Events that already had a completed search and were skipped
    pub skipped: usize,
    /// Events for which a search was attempted
    pub attempted: usize,
    /// Attempted events that produced a scene pairing
    pub found: usize,
    /// Attempted events that completed without an after-scene
    pub not_found: usize,
    /// Attempted events that failed transiently and remain unsearched
    pub failed: usize,
}

impl CorrelationEngine {
    /// Search all events that have not completed a search yet
    ///
    /// Events whose cached result has `searched = true` are skipped; the
    /// rest run through `search` with at most `sweep_concurrency` in flight.
    pub async fn search_missing(
        &self,
        events: &[RainEvent],
        lat: f64,
        lon: f64,
    ) -> SweepStats {
        let mut stats = SweepStats::default();

        let pending: Vec<&RainEvent> = events
            .iter()
            .filter(|event| {
                self.cached(&event.key())
                    .map_or(true, |info| !info.searched)
            })
            .collect();
        stats.skipped = events.len() - pending.len();
        stats.attempted = pending.len();

        if pending.is_empty() {
            info!("Sweep: nothing to search ({} events cached)", stats.skipped);
            return stats;
        }

        let results = stream::iter(pending.into_iter().map(|event| {
            let request = SearchRequest::from_event(event, lat, lon, false);
            async move {
                let outcome = self.search(&request).await;
                (request, outcome)
            }
        }))
        .buffer_unordered(self.config().sweep_concurrency)
        .collect::<Vec<_>>()
        .await;

        for (request, outcome) in results {
            match outcome {
                Ok(info) if info.found => stats.found += 1,
                Ok(_) => stats.not_found += 1,
                Err(e) => {
                    warn!(
                        "Sweep search failed for {} [{} - {}]: {}",
                        request.grid_id, request.event_start, request.event_end, e
                    );
                    stats.failed += 1;
                }
            }
        }

        info!(
            "Sweep finished: {} attempted, {} found, {} not found, {} failed, {} skipped",
            stats.attempted, stats.found, stats.not_found, stats.failed, stats.skipped
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::app::catalog::{SceneCatalogClient, SearchOrder, TimeRange};
    use crate::app::correlation::CorrelationConfig;
    use crate::app::models::SceneMetadata;
    use crate::errors::{CatalogError, CatalogResult};

    struct KeyedCatalog {
        scenes: Mutex<HashMap<DateTime<Utc>, Vec<SceneMetadata>>>,
        failing_starts: Mutex<Vec<DateTime<Utc>>>,
    }

    impl KeyedCatalog {
        fn new() -> Self {
            Self {
                scenes: Mutex::new(HashMap::new()),
                failing_starts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SceneCatalogClient for KeyedCatalog {
        async fn query(
            &self,
            _lat: f64,
            _lon: f64,
            range: TimeRange,
            _order: SearchOrder,
        ) -> CatalogResult<Vec<SceneMetadata>> {
            if self.failing_starts.lock().unwrap().contains(&range.start) {
                return Err(CatalogError::Unavailable { status: 503 });
            }
            Ok(self
                .scenes
                .lock()
                .unwrap()
                .get(&range.start)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn event(grid_id: &str, day: u32) -> RainEvent {
        RainEvent {
            grid_id: grid_id.to_string(),
            start_ts: Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
            end_ts: Utc.with_ymd_and_hms(2024, 6, day, 6, 0, 0).unwrap(),
            max_gauge_mm_h: 10.0,
        }
    }

    fn scene_at(time: DateTime<Utc>) -> SceneMetadata {
        SceneMetadata {
            id: format!("SCENE_{}", time.format("%Y%m%dT%H%M%S")),
            acquisition_time: time,
            platform: None,
            orbit_direction: None,
            relative_orbit: None,
        }
    }

    #[tokio::test]
    async fn test_sweep_counts_outcomes() {
        let catalog = Arc::new(KeyedCatalog::new());
        let found_event = event("G1", 1);
        let empty_event = event("G1", 5);
        let failing_event = event("G1", 10);

        catalog.scenes.lock().unwrap().insert(
            found_event.end_ts,
            vec![scene_at(found_event.end_ts + chrono::Duration::hours(3))],
        );
        catalog
            .failing_starts
            .lock()
            .unwrap()
            .push(failing_event.end_ts);

        let engine = CorrelationEngine::new(CorrelationConfig::default(), catalog);
        let events = vec![found_event, empty_event, failing_event.clone()];

        let stats = engine.search_missing(&events, 35.0, 135.0).await;
        assert_eq!(stats.attempted, 3);
        assert_eq!(stats.found, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped, 0);

        // The failed event stayed unsearched and is retried next sweep
        assert!(engine.cached(&failing_event.key()).is_none());
        let stats = engine.search_missing(&events, 35.0, 135.0).await;
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.attempted, 1);
    }

    #[tokio::test]
    async fn test_sweep_skips_completed_searches() {
        let catalog = Arc::new(KeyedCatalog::new());
        let engine = CorrelationEngine::new(CorrelationConfig::default(), catalog);
        let events = vec![event("G1", 1), event("G1", 5)];

        let first = engine.search_missing(&events, 35.0, 135.0).await;
        assert_eq!(first.attempted, 2);

        // Both events now have searched=true cached (not found is completed)
        let second = engine.search_missing(&events, 35.0, 135.0).await;
        assert_eq!(second.attempted, 0);
        assert_eq!(second.skipped, 2);
    }
}
