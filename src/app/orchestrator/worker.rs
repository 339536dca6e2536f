//! Download worker task
//!
//! One worker runs per claimed product. It waits for a concurrency slot,
//! performs the transfer, translates progress callbacks into registry
//! updates, and settles the job state on every exit path: `Completed` on
//! success, a clean `NotStarted` on cancel, and `NotStarted` with an error
//! message on failure. The active-worker entry is always removed on exit.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::registry::StatusRegistry;
use crate::app::transfer::TransferClient;

/// Everything a worker needs, cloned out of the orchestrator at spawn time
pub(super) struct WorkerContext {
    pub registry: Arc<StatusRegistry>,
    pub transfer: Arc<dyn TransferClient>,
    pub permits: Arc<Semaphore>,
    pub active: Arc<Mutex<HashMap<String, CancellationToken>>>,
    pub destination: PathBuf,
    pub product_id: String,
    pub grid_id: String,
    pub token: CancellationToken,
}

pub(super) async fn run(ctx: WorkerContext) {
    debug!(
        "Worker starting for {} (requested by {})",
        ctx.product_id, ctx.grid_id
    );

    // Queue for a slot; a cancel while queued resets the job without ever
    // touching the transfer client.
    let permit = tokio::select! {
        _ = ctx.token.cancelled() => None,
        permit = Arc::clone(&ctx.permits).acquire_owned() => permit.ok(),
    };

    match permit {
        None => {
            info!("Download cancelled while queued: {}", ctx.product_id);
            ctx.registry.reset(&ctx.product_id, None);
        }
        Some(_permit) => {
            let registry = Arc::clone(&ctx.registry);
            let product_id = ctx.product_id.clone();
            let on_progress = move |percent: f32| {
                registry.update_progress(&product_id, percent);
            };

            let outcome = ctx
                .transfer
                .fetch(&ctx.product_id, &ctx.destination, &on_progress, &ctx.token)
                .await;

            match outcome {
                Ok(()) => {
                    info!("Download completed: {}", ctx.product_id);
                    ctx.registry.complete(&ctx.product_id);
                }
                Err(e) if e.is_cancelled() => {
                    info!("Download cancelled: {}", ctx.product_id);
                    ctx.registry.reset(&ctx.product_id, None);
                }
                Err(e) => {
                    warn!("Download failed: {}: {}", ctx.product_id, e);
                    ctx.registry.reset(&ctx.product_id, Some(e.to_string()));
                }
            }
        }
    }

    let mut active = ctx
        .active
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    active.remove(&ctx.product_id);
}
