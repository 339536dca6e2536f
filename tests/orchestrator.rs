//! Integration tests for the download lifecycle
//!
//! Drives the orchestrator through its public start/status/cancel surface
//! with an in-memory transfer client, covering idempotent starts, progress
//! monotonicity under polling, cooperative cancellation, and failure revert.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use rainsat_fetcher::app::{
    DownloadOrchestrator, DownloadStatus, OrchestratorConfig, TransferClient,
};
use rainsat_fetcher::app::transfer::ProgressCallback;
use rainsat_fetcher::errors::{TransferError, TransferResult};

/// Transfer stub stepping through fixed checkpoints, pausing at a gate so
/// tests control when the transfer may finish
struct StepTransfer {
    checkpoints: Vec<f32>,
    gate: Semaphore,
    fetches: AtomicUsize,
    fail_status: Option<u16>,
}

impl StepTransfer {
    fn open(checkpoints: Vec<f32>) -> Arc<Self> {
        let transfer = Self::gated(checkpoints);
        transfer.gate.add_permits(1000);
        transfer
    }

    fn gated(checkpoints: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            checkpoints,
            gate: Semaphore::new(0),
            fetches: AtomicUsize::new(0),
            fail_status: None,
        })
    }

    fn failing(checkpoints: Vec<f32>, status: u16) -> Arc<Self> {
        let gate = Semaphore::new(0);
        gate.add_permits(1000);
        Arc::new(Self {
            checkpoints,
            gate,
            fetches: AtomicUsize::new(0),
            fail_status: Some(status),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferClient for StepTransfer {
    async fn fetch(
        &self,
        _product_id: &str,
        _destination: &Path,
        on_progress: ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> TransferResult<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        for pct in &self.checkpoints {
            if cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }
            on_progress(*pct);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        // Hold at the last checkpoint until the gate opens or cancel lands
        let permit = tokio::select! {
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            permit = self.gate.acquire() => permit,
        };
        drop(permit);

        match self.fail_status {
            Some(status) => Err(TransferError::Server { status }),
            None => Ok(()),
        }
    }
}

fn orchestrator_with(
    transfer: Arc<dyn TransferClient>,
    max_concurrent: usize,
) -> DownloadOrchestrator {
    let config = OrchestratorConfig {
        download_root: std::env::temp_dir().join("rainsat-int-tests"),
        max_concurrent,
    };
    DownloadOrchestrator::new(config, transfer).unwrap()
}

async fn wait_until<F>(mut predicate: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..500 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(4)).await;
    }
    panic!("condition not reached within 2s");
}

#[tokio::test]
async fn full_download_lifecycle() {
    let transfer = StepTransfer::open(vec![20.0, 60.0, 100.0]);
    let orch = orchestrator_with(transfer.clone(), 2);

    assert_eq!(
        orch.status("S1A_X", "G1").status,
        DownloadStatus::NotStarted
    );
    assert_eq!(orch.start("S1A_X", "G1"), DownloadStatus::Downloading);

    wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::Completed).await;
    let job = orch.status("S1A_X", "G1");
    assert_eq!(job.progress, 100.0);
    assert!(job.error.is_none());
}

#[tokio::test]
async fn double_start_keeps_a_single_worker() {
    let transfer = StepTransfer::gated(vec![40.0]);
    let orch = orchestrator_with(transfer.clone(), 2);

    // StartDownload twice in rapid succession on the same product
    assert_eq!(orch.start("S1A_X", "G1"), DownloadStatus::Downloading);
    assert_eq!(orch.start("S1A_X", "G1"), DownloadStatus::Downloading);

    wait_until(|| orch.status("S1A_X", "G1").progress >= 40.0).await;

    // Exactly one progress-update stream ran, and the second start did not
    // reset progress
    assert_eq!(transfer.fetch_count(), 1);
    assert_eq!(orch.status("S1A_X", "G1").progress, 40.0);

    transfer.release();
    wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::Completed).await;
}

#[tokio::test]
async fn cancel_mid_download_reverts_cleanly() {
    let transfer = StepTransfer::gated(vec![40.0]);
    let orch = orchestrator_with(transfer.clone(), 2);

    orch.start("S1A_X", "G1");
    wait_until(|| orch.status("S1A_X", "G1").progress >= 40.0).await;

    orch.cancel("S1A_X");
    wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::NotStarted).await;

    let job = orch.status("S1A_X", "G1");
    assert_eq!(job.status, DownloadStatus::NotStarted);
    assert_eq!(job.progress, 0.0);
    assert!(job.error.is_none());
}

#[tokio::test]
async fn failed_transfer_surfaces_error_and_restarts() {
    let transfer = StepTransfer::failing(vec![30.0], 502);
    let orch = orchestrator_with(transfer.clone(), 2);

    orch.start("S1A_X", "G1");
    wait_until(|| orch.status("S1A_X", "G1").status == DownloadStatus::NotStarted).await;

    // Failure is never reported as Completed; the message rides the next poll
    let job = orch.status("S1A_X", "G1");
    assert_eq!(job.progress, 0.0);
    assert!(job.error.as_deref().unwrap_or("").contains("502"));

    // The job is restartable, not stuck
    assert_eq!(orch.start("S1A_X", "G1"), DownloadStatus::Downloading);
    wait_until(|| transfer.fetch_count() == 2).await;
}

#[tokio::test]
async fn progress_is_monotonic_under_concurrent_polling() {
    let transfer = StepTransfer::open(vec![5.0, 15.0, 35.0, 55.0, 75.0, 95.0, 100.0]);
    let orch = Arc::new(orchestrator_with(transfer, 2));

    orch.start("S1A_X", "G1");

    let poller = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move {
            let mut last = 0.0f32;
            loop {
                let job = orch.status("S1A_X", "G1");
                assert!(
                    job.progress >= last,
                    "progress moved backwards: {} -> {}",
                    last,
                    job.progress
                );
                last = job.progress;
                if job.status == DownloadStatus::Completed {
                    return last;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    };

    let final_progress = poller.await.unwrap();
    assert_eq!(final_progress, 100.0);
}

#[tokio::test]
async fn distinct_products_download_concurrently() {
    let transfer = StepTransfer::gated(vec![50.0]);
    let orch = orchestrator_with(transfer.clone(), 4);

    orch.start("P1", "G1");
    orch.start("P2", "G2");

    // Both reach the transfer stage side by side
    wait_until(|| transfer.fetch_count() == 2).await;
    assert_eq!(orch.status("P1", "G1").status, DownloadStatus::Downloading);
    assert_eq!(orch.status("P2", "G2").status, DownloadStatus::Downloading);

    transfer.release();
    transfer.release();
    wait_until(|| {
        orch.status("P1", "G1").status == DownloadStatus::Completed
            && orch.status("P2", "G2").status == DownloadStatus::Completed
    })
    .await;
}

#[tokio::test]
async fn burst_beyond_cap_queues_and_drains() {
    let transfer = StepTransfer::gated(vec![10.0]);
    let orch = orchestrator_with(transfer.clone(), 1);

    for i in 0..3 {
        let product = format!("P{}", i);
        assert_eq!(orch.start(&product, "G1"), DownloadStatus::Downloading);
    }

    // Only one worker holds the slot; the rest are queued, not rejected
    wait_until(|| transfer.fetch_count() == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transfer.fetch_count(), 1);
    for i in 0..3 {
        let product = format!("P{}", i);
        assert_eq!(
            orch.status(&product, "G1").status,
            DownloadStatus::Downloading
        );
    }

    // Slots free one by one and every queued start eventually runs
    for _ in 0..3 {
        transfer.release();
    }
    wait_until(|| {
        (0..3).all(|i| {
            orch.status(&format!("P{}", i), "G1").status == DownloadStatus::Completed
        })
    })
    .await;
    assert_eq!(transfer.fetch_count(), 3);
}
