//! Catalog client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{cdse, http, limits};
use crate::errors::{CatalogError, CatalogResult};

/// Configuration for the STAC catalog client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// OAuth2 token endpoint
    pub token_url: String,
    /// STAC item search endpoint
    pub search_url: String,
    /// STAC collection id to query
    pub collection: String,
    /// Half-width of the bounding box around the grid center (degrees)
    pub bbox_margin_deg: f64,
    /// Maximum items per query
    pub query_limit: usize,
    /// Rate limit for catalog requests (requests per second)
    pub rate_limit_rps: u32,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            token_url: cdse::TOKEN_URL.to_string(),
            search_url: cdse::STAC_SEARCH_URL.to_string(),
            collection: cdse::COLLECTION.to_string(),
            bbox_margin_deg: cdse::BBOX_MARGIN_DEG,
            query_limit: cdse::QUERY_LIMIT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
        }
    }
}

impl CatalogConfig {
    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> CatalogResult<()> {
        if self.rate_limit_rps == 0 {
            return Err(CatalogError::InvalidResponse {
                reason: "rate_limit_rps must be greater than 0".to_string(),
            });
        }
        if self.bbox_margin_deg <= 0.0 || self.bbox_margin_deg > 5.0 {
            return Err(CatalogError::InvalidResponse {
                reason: format!(
                    "bbox_margin_deg must be in (0, 5], got {}",
                    self.bbox_margin_deg
                ),
            });
        }
        if self.query_limit == 0 {
            return Err(CatalogError::InvalidResponse {
                reason: "query_limit must be greater than 0".to_string(),
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
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection, "sentinel-1-grd");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_rate_limit_rejected() {
        let config = CatalogConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_bbox_margin_rejected() {
        let config = CatalogConfig {
            bbox_margin_deg: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CatalogConfig {
            bbox_margin_deg: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
