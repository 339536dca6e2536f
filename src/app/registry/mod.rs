//! Concurrency-safe download job registry
//!
//! Process-wide store of per-product download state, created at process start
//! and torn down at process exit; nothing is persisted. Keys are hashed onto a
//! fixed set of mutex-guarded shards so status polls for unrelated products
//! never contend on one lock. Each accessor clones or mutates the whole job
//! under its shard lock, so readers never observe a torn status/progress pair.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use tracing::debug;

use crate::app::models::{DownloadJob, DownloadStatus};
use crate::constants::registry;

/// Sharded mapping from product id to download job state
#[derive(Debug)]
pub struct StatusRegistry {
    shards: Vec<Mutex<HashMap<String, DownloadJob>>>,
}

impl StatusRegistry {
    /// Create a registry with the default shard count
    pub fn new() -> Self {
        Self::with_shards(registry::SHARD_COUNT)
    }

    /// Create a registry with a specific shard count (minimum 1)
    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self { shards }
    }

    fn shard(&self, product_id: &str) -> &Mutex<HashMap<String, DownloadJob>> {
        let mut hasher = DefaultHasher::new();
        product_id.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    fn lock_shard<'a>(
        shard: &'a Mutex<HashMap<String, DownloadJob>>,
    ) -> std::sync::MutexGuard<'a, HashMap<String, DownloadJob>> {
        // A panicked writer cannot leave a job half-updated (each mutation is
        // a single struct write), so recover the map instead of propagating.
        shard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot the job state for a product
    ///
    /// Unknown products read as a fresh `NotStarted` job.
    pub fn get(&self, product_id: &str) -> DownloadJob {
        let guard = Self::lock_shard(self.shard(product_id));
        guard.get(product_id).cloned().unwrap_or_default()
    }

    /// Atomically claim a job for a new worker
    ///
    /// Transitions `NotStarted` to `Downloading` with zeroed progress and a
    /// cleared error, returning `true`. Returns `false` without touching the
    /// job when it is already `Downloading` or `Completed`, which makes
    /// duplicate `start` calls no-ops.
    pub fn try_begin(&self, product_id: &str) -> bool {
        let mut guard = Self::lock_shard(self.shard(product_id));
        let job = guard.entry(product_id.to_string()).or_default();
        match job.status {
            DownloadStatus::NotStarted => {
                job.status = DownloadStatus::Downloading;
                job.progress = 0.0;
                job.error = None;
                true
            }
            DownloadStatus::Downloading | DownloadStatus::Completed => false,
        }
    }

    /// Record transfer progress for an active job
    ///
    /// Values are clamped to [0, 100] and never move backwards; updates for
    /// jobs that are not `Downloading` (e.g. racing a cancel) are dropped.
    pub fn update_progress(&self, product_id: &str, percent: f32) {
        let clamped = percent.clamp(0.0, 100.0);
        let mut guard = Self::lock_shard(self.shard(product_id));
        if let Some(job) = guard.get_mut(product_id) {
            if job.status == DownloadStatus::Downloading && clamped > job.progress {
                job.progress = clamped;
            }
        }
    }

    /// Mark a job as fully transferred
    pub fn complete(&self, product_id: &str) {
        let mut guard = Self::lock_shard(self.shard(product_id));
        let job = guard.entry(product_id.to_string()).or_default();
        job.status = DownloadStatus::Completed;
        job.progress = 100.0;
        job.error = None;
        debug!("Job completed: {}", product_id);
    }

    /// Revert a job to `NotStarted`, optionally attaching an error message
    ///
    /// Used for both cooperative cancellation (no error) and transfer
    /// failures (error surfaced on the next status poll). The job remains
    /// restartable either way.
    pub fn reset(&self, product_id: &str, error: Option<String>) {
        let mut guard = Self::lock_shard(self.shard(product_id));
        let job = guard.entry(product_id.to_string()).or_default();
        job.status = DownloadStatus::NotStarted;
        job.progress = 0.0;
        job.error = error;
    }

    /// Number of tracked jobs across all shards
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| Self::lock_shard(shard).len())
            .sum()
    }

    /// Whether the registry holds no jobs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}
