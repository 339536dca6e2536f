//! Byte transfer for satellite products
//!
//! Defines the transfer contract consumed by the download orchestrator and
//! the production HTTP implementation. Transfers report percent progress
//! through a callback and honor cooperative cancellation at chunk boundaries;
//! a partial artifact never survives as a completed download.

pub mod config;
pub mod http;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::constants::downloads;
use crate::errors::TransferResult;

pub use config::TransferConfig;
pub use http::HttpTransferClient;

/// Progress callback invoked with percent complete in [0, 100]
pub type ProgressCallback<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// Performs the byte transfer for one product
///
/// Implementations stream the artifact to `destination`, invoking
/// `on_progress` as bytes arrive and checking `cancel` at every chunk
/// boundary. Cancellation is cooperative: an in-flight chunk write is never
/// interrupted mid-write.
#[async_trait]
pub trait TransferClient: Send + Sync {
    async fn fetch(
        &self,
        product_id: &str,
        destination: &Path,
        on_progress: ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> TransferResult<()>;
}

/// Path of the in-flight partial artifact for a destination
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(downloads::PART_FILE_SUFFIX);
    destination.with_file_name(name)
}
