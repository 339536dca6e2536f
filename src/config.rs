//! Configuration management for rainsat_fetcher
//!
//! Unified TOML configuration with zero-config defaults: a missing file just
//! yields the defaults, and `init` writes a starter file to the platform
//! config directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CatalogConfig, CorrelationConfig, OrchestratorConfig, TransferConfig};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Scene catalog client settings
    pub catalog: CatalogConfig,
    /// Correlation search policy
    pub correlation: CorrelationConfig,
    /// Transfer client settings
    pub transfer: TransferConfig,
    /// Download orchestration settings
    pub orchestrator: OrchestratorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit path or the default location
    ///
    /// A missing file is not an error: defaults apply, matching first-run
    /// usage. An unreadable or malformed file is reported.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let explicit = path.is_some();
        let path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(AppError::Config(ConfigError::NotFound { path }));
            }
            debug!("No configuration file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
        let config: AppConfig = toml::from_str(&raw).map_err(ConfigError::InvalidFormat)?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write the default configuration to the default location
    pub fn init() -> Result<PathBuf> {
        let path = Self::default_path().ok_or_else(|| {
            AppError::generic("Could not determine a platform configuration directory")
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }

        let rendered = toml::to_string_pretty(&Self::default())
            .map_err(|e| AppError::generic(format!("Failed to render defaults: {}", e)))?;
        std::fs::write(&path, rendered).map_err(ConfigError::Io)?;

        info!("Wrote default configuration to {}", path.display());
        Ok(path)
    }

    /// Platform default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rainsat_fetcher").join("config.toml"))
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;
        self.correlation.validate()?;
        self.orchestrator.validate()?;
        Ok(())
    }
}
