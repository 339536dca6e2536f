//! Satellite scene catalog access
//!
//! Defines the catalog query contract consumed by the correlation engine and
//! the production STAC client implementation. The engine only depends on the
//! [`SceneCatalogClient`] trait, so tests substitute scripted catalogs.

pub mod config;
pub mod stac;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app::models::SceneMetadata;
use crate::errors::CatalogResult;

pub use config::CatalogConfig;
pub use stac::StacCatalogClient;

/// Ordering of scenes returned by a catalog query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    /// Earliest acquisition first
    Ascending,
    /// Latest acquisition first
    Descending,
}

/// Inclusive acquisition-time range for a catalog query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether a timestamp falls inside the range
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Query interface for a satellite scene catalog
///
/// Implementations return a finite, ordered sequence of scenes whose
/// acquisition timestamps fall inside the requested range. Failures map to
/// `CatalogError::Unavailable` or `CatalogError::Timeout`.
#[async_trait]
pub trait SceneCatalogClient: Send + Sync {
    /// Query scenes covering the point (lat, lon) within `range`,
    /// ordered per `order`
    async fn query(
        &self,
        lat: f64,
        lon: f64,
        range: TimeRange,
        order: SearchOrder,
    ) -> CatalogResult<Vec<SceneMetadata>>;
}

/// Sort scenes deterministically for boundary selection
///
/// Equal acquisition timestamps are resolved by ascending scene id, so
/// repeated queries select the same candidate regardless of the order the
/// catalog service happened to return them in.
pub fn sort_scenes(scenes: &mut [SceneMetadata], order: SearchOrder) {
    match order {
        SearchOrder::Ascending => {
            scenes.sort_by(|a, b| {
                a.acquisition_time
                    .cmp(&b.acquisition_time)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        SearchOrder::Descending => {
            scenes.sort_by(|a, b| {
                b.acquisition_time
                    .cmp(&a.acquisition_time)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scene(id: &str, hour: u32) -> SceneMetadata {
        SceneMetadata {
            id: id.to_string(),
            acquisition_time: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            platform: None,
            orbit_direction: None,
            relative_orbit: None,
        }
    }

    #[test]
    fn test_time_range_contains() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        );

        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 1).unwrap()));
    }

    #[test]
    fn test_sort_ascending_with_id_tiebreak() {
        let mut scenes = vec![scene("B", 3), scene("A", 3), scene("C", 1)];
        sort_scenes(&mut scenes, SearchOrder::Ascending);

        let ids: Vec<&str> = scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_sort_descending_with_id_tiebreak() {
        let mut scenes = vec![scene("B", 3), scene("C", 9), scene("A", 3)];
        sort_scenes(&mut scenes, SearchOrder::Descending);

        let ids: Vec<&str> = scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_sort_is_stable_across_input_orderings() {
        let mut first = vec![scene("A", 3), scene("B", 3)];
        let mut second = vec![scene("B", 3), scene("A", 3)];

        sort_scenes(&mut first, SearchOrder::Ascending);
        sort_scenes(&mut second, SearchOrder::Ascending);
        assert_eq!(first, second);
    }
}
