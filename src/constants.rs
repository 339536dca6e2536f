//! Application constants for rainsat_fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the CDSE OAuth2 client id
    pub const CLIENT_ID: &str = "CDSE_CLIENT_ID";

    /// Environment variable name for the CDSE OAuth2 client secret
    pub const CLIENT_SECRET: &str = "CDSE_CLIENT_SECRET";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Minimum allowed client id length
    pub const MIN_CLIENT_ID_LENGTH: usize = 3;

    /// Maximum allowed client id length
    pub const MAX_CLIENT_ID_LENGTH: usize = 128;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;

    /// Margin subtracted from the token lifetime before refresh
    pub const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "rainsat-fetcher/0.1.0 (Rain Event Correlation Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for catalog requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// CDSE service URLs and query parameters
pub mod cdse {
    /// OAuth2 token endpoint
    pub const TOKEN_URL: &str =
        "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

    /// STAC item search endpoint
    pub const STAC_SEARCH_URL: &str = "https://stac.dataspace.copernicus.eu/v1/search";

    /// STAC collection id for Sentinel-1 GRD products
    pub const COLLECTION: &str = "sentinel-1-grd";

    /// Product download base URL
    pub const DOWNLOAD_BASE_URL: &str = "https://download.dataspace.copernicus.eu/odata/v1";

    /// Half-width of the bounding box around a grid center (degrees)
    pub const BBOX_MARGIN_DEG: f64 = 0.2;

    /// Maximum items requested per catalog query
    pub const QUERY_LIMIT: usize = 100;
}

/// Correlation search policy
pub mod search {
    use super::Duration;

    /// Search window on either side of an event (hours)
    pub const WINDOW_HOURS: i64 = 12;

    /// Deadline for a single catalog query
    pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

    /// Bounded concurrency for "search all missing" sweeps
    pub const SWEEP_CONCURRENCY: usize = 4;
}

/// Download orchestration constants
pub mod downloads {
    use super::Duration;

    /// Default maximum concurrent download workers
    pub const MAX_CONCURRENT: usize = 2;

    /// Suffix for in-flight partial artifacts
    pub const PART_FILE_SUFFIX: &str = ".part";

    /// Interval between CLI status polls
    pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
}

/// Status registry constants
pub mod registry {
    /// Number of lock shards in the status registry
    pub const SHARD_COUNT: usize = 16;
}

// Re-export commonly used constants for convenience
pub use cdse::{DOWNLOAD_BASE_URL, STAC_SEARCH_URL, TOKEN_URL};
pub use downloads::MAX_CONCURRENT as DEFAULT_MAX_CONCURRENT_DOWNLOADS;
pub use env::{CLIENT_ID as ENV_CLIENT_ID, CLIENT_SECRET as ENV_CLIENT_SECRET};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use search::WINDOW_HOURS as DEFAULT_WINDOW_HOURS;
