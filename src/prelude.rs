//! Prelude module for the rainsat_fetcher Library
//!
//! Re-exports the most commonly used items from the library, providing a
//! convenient way to import everything needed for typical usage with a
//! single `use rainsat_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rainsat_fetcher::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let catalog = Arc::new(StacCatalogClient::new(CatalogConfig::default())?);
//! let engine = CorrelationEngine::new(CorrelationConfig::default(), catalog);
//!
//! let transfer = Arc::new(HttpTransferClient::new(TransferConfig::default())?);
//! let orchestrator = DownloadOrchestrator::new(OrchestratorConfig::default(), transfer)?;
//!
//! // Continue with search and download calls...
//! # Ok(())
//! # }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    CatalogConfig,
    CorrelationConfig,
    // Core orchestration
    CorrelationEngine,
    DownloadJob,
    DownloadOrchestrator,
    DownloadStatus,
    EventKey,
    EventStore,
    HttpTransferClient,
    JsonEventStore,
    OrchestratorConfig,
    // Data types
    RainEvent,
    SatelliteInfo,
    SceneCatalogClient,
    SceneMetadata,
    SearchRequest,
    StacCatalogClient,
    StatusRegistry,
    SweepStats,
    TransferClient,
    TransferConfig,
};

// Authentication functions
pub use crate::auth::{check_credentials, get_auth_status, setup_credentials, AuthStatus};

// Commonly used constants
pub use crate::constants::{
    DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_RATE_LIMIT_RPS, DEFAULT_WINDOW_HOURS,
    ENV_CLIENT_ID, ENV_CLIENT_SECRET, USER_AGENT,
};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

// Common external crate re-exports for convenience
pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        // Verify that all essential types are available through prelude
        let _catalog_config = CatalogConfig::default();
        let _correlation_config = CorrelationConfig::default();
        let _orchestrator_config = OrchestratorConfig::default();
        let _transfer_config = TransferConfig::default();

        // Test that auth functions are available
        let _has_creds = check_credentials();
        let _auth_status = get_auth_status();

        // Test that constants are available
        assert_eq!(DEFAULT_WINDOW_HOURS, 12);
        assert!(USER_AGENT.contains("rainsat-fetcher"));
    }

    #[test]
    fn test_registry_through_prelude() {
        let registry = StatusRegistry::new();
        assert!(registry.is_empty());

        let data = Arc::new(42);
        assert_eq!(*data, 42);
    }
}
