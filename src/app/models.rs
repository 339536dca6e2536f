//! Data models for rainsat_fetcher
//!
//! This module defines the core data structures used throughout the
//! application: rain events, satellite scene metadata, correlation results,
//! and download job state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous rainfall window at a single grid cell
///
/// Produced by the external event store and immutable once observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainEvent {
    /// Grid cell identifier
    pub grid_id: String,
    /// Event window start (UTC)
    pub start_ts: DateTime<Utc>,
    /// Event window end (UTC)
    pub end_ts: DateTime<Utc>,
    /// Peak gauge-derived rainfall over the window (mm/h)
    pub max_gauge_mm_h: f64,
}

impl RainEvent {
    /// Stable cache identity for correlation results
    pub fn key(&self) -> EventKey {
        EventKey {
            grid_id: self.grid_id.clone(),
            start_ts: self.start_ts,
            end_ts: self.end_ts,
        }
    }
}

/// Cache key for a correlation search: event identity is the grid plus the
/// exact event window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub grid_id: String,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

/// Metadata for a single satellite scene acquisition, sourced from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Product identifier
    pub id: String,
    /// Acquisition timestamp (UTC)
    pub acquisition_time: DateTime<Utc>,
    /// Platform name, e.g. "S1A"
    pub platform: Option<String>,
    /// Pass direction, e.g. "ASC" or "DSC"
    pub orbit_direction: Option<String>,
    /// Relative orbit number
    pub relative_orbit: Option<u32>,
}

/// Normalize a platform string to its short mission code
///
/// "Sentinel-1A" and "sentinel-1a" both map to "S1A".
pub fn normalize_mission(platform: Option<&str>) -> Option<String> {
    let platform = platform?;
    let p = platform.to_lowercase();
    if p.contains("sentinel-1a") || p.ends_with("1a") || p == "s1a" {
        return Some("S1A".to_string());
    }
    if p.contains("sentinel-1b") || p.ends_with("1b") || p == "s1b" {
        return Some("S1B".to_string());
    }
    if p.contains("sentinel-1") {
        return Some("S1".to_string());
    }
    Some(platform.chars().take(8).collect::<String>().to_uppercase())
}

/// Normalize a pass direction string to "ASC" or "DSC"
pub fn normalize_pass_direction(direction: Option<&str>) -> Option<String> {
    let direction = direction?;
    let d = direction.to_lowercase();
    if d.starts_with("asc") {
        return Some("ASC".to_string());
    }
    if d.starts_with("des") {
        return Some("DSC".to_string());
    }
    Some(direction.chars().take(3).collect::<String>().to_uppercase())
}

/// Result of a correlation search for one rain event
///
/// The latest successful search for an event identity is the authoritative
/// cached value. `searched` is only set by a completed catalog attempt;
/// timed-out or errored attempts never produce one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteInfo {
    /// Whether a usable after-scene was located
    pub found: bool,
    /// Whether a catalog attempt completed for this event
    pub searched: bool,
    /// Hours between event end and the after-scene acquisition, one decimal
    pub delay_hours: Option<f64>,
    /// Nearest scene acquired at or after the event end
    pub after: Option<SceneMetadata>,
    /// Nearest scene acquired at or before the event start (informational)
    pub before: Option<SceneMetadata>,
}

impl SatelliteInfo {
    /// State before any catalog attempt has completed
    pub fn not_searched() -> Self {
        Self {
            found: false,
            searched: false,
            delay_hours: None,
            after: None,
            before: None,
        }
    }

    /// Build the result of a completed search
    ///
    /// `found` follows the after scene alone; `before` never gates it.
    pub fn searched(
        after: Option<SceneMetadata>,
        before: Option<SceneMetadata>,
        event_end: DateTime<Utc>,
    ) -> Self {
        let delay_hours = after
            .as_ref()
            .map(|scene| delay_hours(event_end, scene.acquisition_time));
        Self {
            found: after.is_some(),
            searched: true,
            delay_hours,
            after,
            before,
        }
    }
}

/// Elapsed hours from event end to acquisition, rounded to one decimal
pub fn delay_hours(event_end: DateTime<Utc>, acquisition: DateTime<Utc>) -> f64 {
    let seconds = (acquisition - event_end).num_seconds() as f64;
    round_one_decimal(seconds / 3600.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Lifecycle state of a download job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// No worker has run, or the last worker was cancelled or failed
    NotStarted,
    /// A worker is active (or queued for a slot)
    Downloading,
    /// The artifact was fully transferred
    Completed,
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DownloadStatus::NotStarted => "not_started",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Download job state, keyed by product id in the status registry
///
/// Download identity is independent of which grid requested it: a product
/// downloaded once satisfies all requesters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Current lifecycle state
    pub status: DownloadStatus,
    /// Transfer progress in percent, clamped to [0, 100]
    pub progress: f32,
    /// Message from the most recent failed attempt, if any
    pub error: Option<String>,
}

impl DownloadJob {
    /// Fresh job state prior to any start
    pub fn new() -> Self {
        Self {
            status: DownloadStatus::NotStarted,
            progress: 0.0,
            error: None,
        }
    }

    /// Whether a worker is currently bound to this job
    pub fn is_active(&self) -> bool {
        self.status == DownloadStatus::Downloading
    }

    /// Whether the artifact transfer finished
    pub fn is_completed(&self) -> bool {
        self.status == DownloadStatus::Completed
    }
}

impl Default for DownloadJob {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a product identifier to its file stem
///
/// CDSE product identifiers may carry a trailing ".SAFE" that is not part of
/// the artifact name on disk.
pub fn product_stem(product_id: &str) -> &str {
    product_id.strip_suffix(".SAFE").unwrap_or(product_id)
}
