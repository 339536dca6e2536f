//! Download orchestration
//!
//! Exposes the start/status/cancel surface over the per-product download
//! state machine. Starting a product is idempotent: a job that is already
//! downloading or completed is returned unchanged and no second worker is
//! spawned. Cancellation is cooperative through a token the worker checks at
//! transfer checkpoints. A shared semaphore bounds concurrent workers;
//! start calls beyond the cap queue for a slot rather than being rejected.

pub mod config;
mod worker;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::models::{DownloadJob, DownloadStatus};
use crate::app::registry::StatusRegistry;
use crate::app::transfer::TransferClient;
use crate::errors::Result;

pub use config::OrchestratorConfig;

/// Orchestrates per-product download workers
pub struct DownloadOrchestrator {
    config: OrchestratorConfig,
    registry: Arc<StatusRegistry>,
    transfer: Arc<dyn TransferClient>,
    permits: Arc<Semaphore>,
    active: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl std::fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("config", &self.config)
            .finish()
    }
}

impl DownloadOrchestrator {
    /// Create an orchestrator over a transfer client
    pub fn new(config: OrchestratorConfig, transfer: Arc<dyn TransferClient>) -> Result<Self> {
        config.validate()?;
        let permits = Arc::new(Semaphore::new(config.max_concurrent));

        Ok(Self {
            config,
            registry: Arc::new(StatusRegistry::new()),
            transfer,
            permits,
            active: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Shared job registry, for status readers
    pub fn registry(&self) -> Arc<StatusRegistry> {
        Arc::clone(&self.registry)
    }

    /// Start a download, or report the state of the one already running
    ///
    /// Must be called from within a tokio runtime: the worker is spawned as
    /// a background task bound to a fresh cancellation token.
    pub fn start(&self, product_id: &str, grid_id: &str) -> DownloadStatus {
        let token = {
            let mut active = self.lock_active();

            // The claim and the token registration happen under one lock so
            // a concurrent cancel always finds the token of a claimed job.
            if !self.registry.try_begin(product_id) {
                let status = self.registry.get(product_id).status;
                debug!(
                    "Duplicate start for {} ignored (status: {})",
                    product_id, status
                );
                return status;
            }

            let token = CancellationToken::new();
            active.insert(product_id.to_string(), token.clone());
            token
        };

        info!("Starting download: {} (grid {})", product_id, grid_id);
        let ctx = worker::WorkerContext {
            registry: Arc::clone(&self.registry),
            transfer: Arc::clone(&self.transfer),
            permits: Arc::clone(&self.permits),
            active: Arc::clone(&self.active),
            destination: self.config.product_path(product_id),
            product_id: product_id.to_string(),
            grid_id: grid_id.to_string(),
            token,
        };
        tokio::spawn(worker::run(ctx));

        DownloadStatus::Downloading
    }

    /// Snapshot the job state for a product
    ///
    /// `grid_id` is accepted for contextual logging only; it does not affect
    /// job identity.
    pub fn status(&self, product_id: &str, _grid_id: &str) -> DownloadJob {
        self.registry.get(product_id)
    }

    /// Request cooperative cancellation of an active download
    ///
    /// The worker observes the signal at its next transfer checkpoint,
    /// discards any partial artifact, and reverts the job to `NotStarted`.
    /// Calling cancel with no active worker is a no-op.
    pub fn cancel(&self, product_id: &str) -> DownloadJob {
        {
            let active = self.lock_active();
            if let Some(token) = active.get(product_id) {
                info!("Cancellation requested: {}", product_id);
                token.cancel();
            } else {
                debug!("Cancel for {} ignored: no active worker", product_id);
            }
        }
        self.registry.get(product_id)
    }

    fn lock_active(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::app::transfer::ProgressCallback;
    use crate::errors::{TransferError, TransferResult};

    /// Transfer stub that walks a list of progress checkpoints, gated on a
    /// semaphore so tests control when a fetch may proceed
    struct ScriptedTransfer {
        checkpoints: Vec<f32>,
        fail_with: Option<u16>,
        gate: Semaphore,
        fetches: AtomicUsize,
    }

    impl ScriptedTransfer {
        fn ungated(checkpoints: Vec<f32>) -> Arc<Self> {
            let gate = Semaphore::new(0);
            gate.add_permits(Semaphore::MAX_PERMITS);
            Arc::new(Self {
                checkpoints,
                fail_with: None,
                gate,
                fetches: AtomicUsize::new(0),
            })
        }

        fn gated(checkpoints: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                checkpoints,
                fail_with: None,
                gate: Semaphore::new(0),
                fetches: AtomicUsize::new(0),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            let gate = Semaphore::new(0);
            gate.add_permits(Semaphore::MAX_PERMITS);
            Arc::new(Self {
                checkpoints: vec![10.0, 25.0],
                fail_with: Some(status),
                gate,
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn release_one(&self) {
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl super::TransferClient for ScriptedTransfer {
        async fn fetch(
            &self,
            _product_id: &str,
            _destination: &Path,
            on_progress: ProgressCallback<'_>,
            cancel: &CancellationToken,
        ) -> TransferResult<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);

            let permit = tokio::select! {
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                permit = self.gate.acquire() => permit,
            };
            drop(permit);

            for pct in &self.checkpoints {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                on_progress(*pct);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            if cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }
            match self.fail_with {
                Some(status) => Err(TransferError::Server { status }),
                None => Ok(()),
            }
        }
    }

    /// Transfer stub that reports one checkpoint and then waits for cancel
    struct HoldingTransfer {
        hold_at: f32,
        fetches: AtomicUsize,
    }

    impl HoldingTransfer {
        fn new(hold_at: f32) -> Arc<Self> {
            Arc::new(Self {
                hold_at,
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl super::TransferClient for HoldingTransfer {
        async fn fetch(
            &self,
            _product_id: &str,
            _destination: &Path,
            on_progress: ProgressCallback<'_>,
            cancel: &CancellationToken,
        ) -> TransferResult<()> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            on_progress(self.hold_at);
            cancel.cancelled().await;
            Err(TransferError::Cancelled)
        }
    }

    fn orchestrator(transfer: Arc<dyn TransferClient>) -> DownloadOrchestrator {
        let config = OrchestratorConfig {
            download_root: std::env::temp_dir().join("rainsat-orchestrator-tests"),
            max_concurrent: 2,
        };
        DownloadOrchestrator::new(config, transfer).unwrap()
    }

    async fn wait_until<F>(mut predicate: F)
    where
        F: FnMut() -> bool,
    {
        for _ in 0..400 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within 2s");
    }

    #[tokio::test]
    async fn test_download_runs_to_completion() {
        let transfer = ScriptedTransfer::ungated(vec![25.0, 50.0, 100.0]);
        let orch = orchestrator(transfer.clone());

        let status = orch.start("S1A_X", "G1");
        assert_eq!(status, DownloadStatus::Downloading);

        wait_until(|| orch.status("S1A_X", "G1").is_completed()).await;
        let job = orch.status("S1A_X", "G1");
        assert_eq!(job.progress, 100.0);
        assert!(job.error.is_none());
        assert_eq!(transfer.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_start_spawns_one_worker() {
        let transfer = HoldingTransfer::new(40.0);
        let orch = orchestrator(transfer.clone());

        orch.start("S1A_X", "G1");
        wait_until(|| orch.status("S1A_X", "G1").progress >= 40.0).await;

        // Second start returns the running state and never resets progress
        let status = orch.start("S1A_X", "G1");
        assert_eq!(status, DownloadStatus::Downloading);
        assert_eq!(orch.status("S1A_X", "G1").progress, 40.0);
        assert_eq!(transfer.fetches.load(Ordering::SeqCst), 1);

        orch.cancel("S1A_X");
    }

    #[tokio::test]
    async fn test_start_on_completed_job_is_noop() {
        let transfer = ScriptedTransfer::ungated(vec![100.0]);
        let orch = orchestrator(transfer.clone());

        orch.start("S1A_X", "G1");
        wait_until(|| orch.status("S1A_X", "G1").is_completed()).await;

        let status = orch.start("S1A_X", "G1");
        assert_eq!(status, DownloadStatus::Completed);
        assert_eq!(transfer.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_reverts_to_not_started() {
        let transfer = HoldingTransfer::new(40.0);
        let orch = orchestrator(transfer);

        orch.start("S1A_X", "G1");
        wait_until(|| orch.status("S1A_X", "G1").progress >= 40.0).await;

        orch.cancel("S1A_X");
        wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::NotStarted).await;

        let job = orch.status("S1A_X", "G1");
        assert_eq!(job.progress, 0.0);
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_job_is_restartable() {
        let transfer = ScriptedTransfer::gated(vec![50.0, 100.0]);
        let orch = orchestrator(transfer.clone());

        orch.start("S1A_X", "G1");
        wait_until(|| transfer.fetch_count() == 1).await;
        orch.cancel("S1A_X");
        wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::NotStarted).await;

        // Restart succeeds once the gate opens
        let status = orch.start("S1A_X", "G1");
        assert_eq!(status, DownloadStatus::Downloading);
        transfer.release_one();
        wait_until(|| orch.status("S1A_X", "G1").is_completed()).await;
        assert_eq!(transfer.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_without_worker_is_noop() {
        let transfer = ScriptedTransfer::ungated(vec![100.0]);
        let orch = orchestrator(transfer);

        let job = orch.cancel("S1A_X");
        assert_eq!(job.status, DownloadStatus::NotStarted);

        orch.start("S1A_X", "G1");
        wait_until(|| orch.status("S1A_X", "G1").is_completed()).await;

        // Cancel after completion leaves the terminal state alone
        let job = orch.cancel("S1A_X");
        assert_eq!(job.status, DownloadStatus::Completed);
        assert_eq!(orch.status("S1A_X", "G1").progress, 100.0);
    }

    #[tokio::test]
    async fn test_transfer_error_reverts_with_message() {
        let transfer = ScriptedTransfer::failing(500);
        let orch = orchestrator(transfer.clone());

        orch.start("S1A_X", "G1");
        wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::NotStarted).await;

        let job = orch.status("S1A_X", "G1");
        assert_eq!(job.progress, 0.0);
        assert!(job.error.as_deref().unwrap_or("").contains("500"));

        // Failed jobs restart and the error clears on the new claim
        orch.start("S1A_X", "G1");
        assert!(orch.status("S1A_X", "G1").error.is_none());
    }

    #[tokio::test]
    async fn test_starts_beyond_cap_queue_for_a_slot() {
        let transfer = ScriptedTransfer::gated(vec![100.0]);
        let config = OrchestratorConfig {
            download_root: std::env::temp_dir().join("rainsat-orchestrator-tests"),
            max_concurrent: 1,
        };
        let orch = DownloadOrchestrator::new(config, transfer.clone()).unwrap();

        orch.start("P1", "G1");
        orch.start("P2", "G1");

        // Only the slot holder reaches the transfer client; the other start
        // is queued but still reports Downloading.
        wait_until(|| transfer.fetch_count() == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transfer.fetch_count(), 1);
        assert_eq!(orch.status("P2", "G1").status, DownloadStatus::Downloading);

        transfer.release_one();
        transfer.release_one();
        wait_until(|| {
            orch.status("P1", "G1").is_completed() && orch.status("P2", "G1").is_completed()
        })
        .await;
        assert_eq!(transfer.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_while_queued_never_reaches_transfer() {
        let hold = HoldingTransfer::new(10.0);
        let config = OrchestratorConfig {
            download_root: std::env::temp_dir().join("rainsat-orchestrator-tests"),
            max_concurrent: 1,
        };
        let orch = DownloadOrchestrator::new(config, hold.clone()).unwrap();

        orch.start("P1", "G1");
        wait_until(|| hold.fetches.load(Ordering::SeqCst) == 1).await;

        // P2 queues behind P1, then gets cancelled before a slot frees
        orch.start("P2", "G1");
        orch.cancel("P2");
        wait_until(|| orch.status("P2", "G1").status == DownloadStatus::NotStarted).await;
        assert_eq!(hold.fetches.load(Ordering::SeqCst), 1);

        orch.cancel("P1");
    }
}
