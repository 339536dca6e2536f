//! Authentication and credential management
//!
//! This module handles storage, retrieval, and validation of the CDSE OAuth2
//! client credentials used by the catalog and transfer clients.

pub mod credentials;

pub use credentials::{
    check_credentials, get_auth_status, save_credentials, setup_credentials, show_auth_status,
    verify_credentials, AuthStatus,
};
