//! Read-only rain event access
//!
//! The event store is an external collaborator: something else derives rain
//! events from gauge data and persists them. This module defines the
//! paginated read contract plus a JSON-file-backed implementation used by the
//! CLI sweep command.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::app::models::RainEvent;
use crate::errors::{EventStoreError, EventStoreResult};

/// Paginated, read-only supply of rain events per grid
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Fetch one page of events for a grid, ordered as stored
    async fn fetch_events(
        &self,
        grid_id: &str,
        offset: usize,
        limit: usize,
    ) -> EventStoreResult<Vec<RainEvent>>;
}

/// Drain every page of a grid's events from a store
pub async fn collect_all_events(
    store: &dyn EventStore,
    grid_id: &str,
    page_size: usize,
) -> EventStoreResult<Vec<RainEvent>> {
    let page_size = page_size.max(1);
    let mut events = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.fetch_events(grid_id, offset, page_size).await?;
        let fetched = page.len();
        events.extend(page);
        if fetched < page_size {
            break;
        }
        offset += fetched;
    }

    debug!("Collected {} events for grid {}", events.len(), grid_id);
    Ok(events)
}

/// Event store reading a JSON array of rain events from disk
///
/// The file holds every grid's events in one array; pagination slices the
/// grid-filtered view.
#[derive(Debug, Clone)]
pub struct JsonEventStore {
    path: PathBuf,
}

impl JsonEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> EventStoreResult<Vec<RainEvent>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EventStoreError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                EventStoreError::Io(e)
            }
        })?;
        let events: Vec<RainEvent> = serde_json::from_slice(&bytes)?;
        Ok(events)
    }
}

#[async_trait]
impl EventStore for JsonEventStore {
    async fn fetch_events(
        &self,
        grid_id: &str,
        offset: usize,
        limit: usize,
    ) -> EventStoreResult<Vec<RainEvent>> {
        let events = self.load().await?;
        Ok(events
            .into_iter()
            .filter(|event| event.grid_id == grid_id)
            .skip(offset)
            .take(limit)
            .collect())
    }
}
