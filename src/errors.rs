//! Error types for rainsat_fetcher
//!
//! This module defines the error types for all components of the application.
//! Transient catalog and transfer failures are deliberately separated from
//! hard input rejections: the former are absorbed into component state so
//! retry sweeps can revisit them, the latter are returned to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing environment variables for credentials
    #[error(
        "Missing CDSE credentials. Set CDSE_CLIENT_ID and CDSE_CLIENT_SECRET environment variables or run 'auth setup'"
    )]
    MissingCredentials,

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// HTTP request failed during token exchange
    #[error("HTTP request failed during authentication")]
    Http(#[from] reqwest::Error),

    /// Token endpoint rejected the credentials
    #[error("CDSE token request rejected with HTTP {status}. Please check your credentials")]
    TokenRejected { status: u16 },

    /// Token response could not be interpreted
    #[error("Malformed token response: {reason}")]
    MalformedToken { reason: String },

    /// Invalid client id format
    #[error("Invalid client id: {reason}")]
    InvalidClientId { reason: String },

    /// File I/O error during credential storage
    #[error("Failed to save credentials to file")]
    CredentialStorage(#[from] std::io::Error),
}

/// Scene catalog query errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request error
    #[error("Catalog HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Authentication failure while talking to the catalog
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog endpoint returned an error status
    #[error("Catalog unavailable: HTTP {status}")]
    Unavailable { status: u16 },

    /// Query exceeded its deadline
    #[error("Catalog query timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Rate limit exhausted after retries
    #[error("Catalog rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Response body could not be interpreted as a scene list
    #[error("Invalid catalog response: {reason}")]
    InvalidResponse { reason: String },
}

/// Correlation search errors
#[derive(Error, Debug)]
pub enum CorrelationError {
    /// Malformed coordinates or time range - rejected before any query
    #[error("Invalid search request: {reason}")]
    Validation { reason: String },

    /// Catalog could not be reached; the cached state is untouched
    #[error("Catalog unavailable during search")]
    CatalogUnavailable(#[source] CatalogError),

    /// Catalog query deadline exceeded; the cached state is untouched
    #[error("Catalog query timed out after {seconds} seconds")]
    CatalogTimeout { seconds: u64 },
}

impl CorrelationError {
    /// Transient failures leave `searched = false` and are safe to retry
    pub fn is_transient(&self) -> bool {
        !matches!(self, CorrelationError::Validation { .. })
    }
}

impl From<CatalogError> for CorrelationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Timeout { seconds } => CorrelationError::CatalogTimeout { seconds },
            other => CorrelationError::CatalogUnavailable(other),
        }
    }
}

/// Byte transfer errors
#[derive(Error, Debug)]
pub enum TransferError {
    /// HTTP request error
    #[error("Transfer HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// File I/O error while writing the artifact
    #[error("Transfer I/O error")]
    Io(#[from] std::io::Error),

    /// Server returned error status
    #[error("Transfer server error: HTTP {status}")]
    Server { status: u16 },

    /// Invalid product URL
    #[error("Invalid product URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Cooperative cancellation observed at a chunk boundary
    #[error("Transfer cancelled")]
    Cancelled,

    /// Byte count did not match the advertised content length
    #[error("Incomplete transfer: received {received} bytes, expected {expected} bytes")]
    Incomplete { received: u64, expected: u64 },
}

impl TransferError {
    /// Whether this failure was a cooperative cancel rather than an error
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransferError::Cancelled)
    }
}

/// Event store errors
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// Event file not found
    #[error("Event file not found: {path}")]
    NotFound { path: PathBuf },

    /// JSON parsing error
    #[error("JSON parsing error in event file")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error reading events
    #[error("I/O error reading events")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading or writing configuration
    #[error("Configuration I/O error")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Correlation error
    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    /// Transfer error
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Event store error
    #[error(transparent)]
    Events(#[from] EventStoreError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Catalog(CatalogError::Http(_))
            | AppError::Catalog(CatalogError::Timeout { .. })
            | AppError::Catalog(CatalogError::Unavailable { .. })
            | AppError::Catalog(CatalogError::RateLimitExceeded)
            | AppError::Correlation(CorrelationError::CatalogUnavailable(_))
            | AppError::Correlation(CorrelationError::CatalogTimeout { .. })
            | AppError::Transfer(TransferError::Http(_))
            | AppError::Transfer(TransferError::Server { .. })
            | AppError::Auth(AuthError::Http(_)) => true,

            AppError::Auth(AuthError::MissingCredentials)
            | AppError::Correlation(CorrelationError::Validation { .. })
            | AppError::Config(ConfigError::InvalidFormat(_)) => false,

            _ => false,
        }
    }

    /// Get error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Catalog(_) => "catalog",
            AppError::Correlation(_) => "correlation",
            AppError::Transfer(_) => "transfer",
            AppError::Events(_) => "events",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Correlation result type alias
pub type CorrelationResult<T> = std::result::Result<T, CorrelationError>;

/// Transfer result type alias
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Event store result type alias
pub type EventStoreResult<T> = std::result::Result<T, EventStoreError>;
