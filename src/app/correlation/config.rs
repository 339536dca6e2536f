//! Correlation engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::search;
use crate::errors::{CorrelationError, CorrelationResult};

/// Policy knobs for the correlation search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Search window on either side of an event (hours)
    pub window_hours: i64,
    /// Deadline for a single catalog query in seconds
    pub query_timeout_secs: u64,
    /// Bounded concurrency for "search all missing" sweeps
    pub sweep_concurrency: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_hours: search::WINDOW_HOURS,
            query_timeout_secs: search::QUERY_TIMEOUT.as_secs(),
            sweep_concurrency: search::SWEEP_CONCURRENCY,
        }
    }
}

impl CorrelationConfig {
    /// Search window as a chrono Duration
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.window_hours)
    }

    /// Catalog query deadline as a std Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> CorrelationResult<()> {
        if self.window_hours <= 0 {
            return Err(CorrelationError::Validation {
                reason: format!("window_hours must be positive, got {}", self.window_hours),
            });
        }
        if self.sweep_concurrency == 0 {
            return Err(CorrelationError::Validation {
                reason: "sweep_concurrency must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CorrelationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window(), chrono::Duration::hours(12));
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let config = CorrelationConfig {
            window_hours: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_sweep_concurrency_rejected() {
        let config = CorrelationConfig {
            sweep_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
