//! Download orchestrator configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::models::product_stem;
use crate::constants::downloads;
use crate::errors::{AppError, Result};

/// Configuration for the download orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Directory that receives completed artifacts
    pub download_root: PathBuf,
    /// Maximum concurrent download workers; further starts queue for a slot
    pub max_concurrent: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            download_root: PathBuf::from("products"),
            max_concurrent: downloads::MAX_CONCURRENT,
        }
    }
}

impl OrchestratorConfig {
    /// Destination path for a product artifact
    pub fn product_path(&self, product_id: &str) -> PathBuf {
        self.download_root
            .join(format!("{}.zip", product_stem(product_id)))
    }

    /// Destination directory accessor
    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(AppError::generic(
                "max_concurrent must be greater than 0",
            ));
        }
        Ok(())
    }
}
